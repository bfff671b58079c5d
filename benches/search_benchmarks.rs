use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geoseek::{Config, Facility, FacilityIndex, RadiusQuery, SearchMethod};
use std::time::Duration;

fn generate_facilities(count: usize) -> Vec<Facility> {
    let mut state: u64 = 0x853C_49E6_748F_EA9B;
    let mut next_unit = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    (0..count)
        .map(|i| {
            let lat = 35.5 + next_unit() * 0.4;
            let lon = 139.4 + next_unit() * 0.6;
            Facility::new(i as u64, format!("Facility {i}"), format!("{i}-1"), lat, lon)
        })
        .collect()
}

fn benchmark_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    group.bench_function("encode_precision_6", |b| {
        b.iter(|| geoseek::geokey::encode(black_box(35.6895), black_box(139.6917), 6).unwrap())
    });

    let key = geoseek::geokey::encode(35.6895, 139.6917, 6).unwrap();
    group.bench_function("decode_precision_6", |b| {
        b.iter(|| geoseek::geokey::decode(black_box(&key)).unwrap())
    });

    group.bench_function("neighbors", |b| {
        b.iter(|| geoseek::geokey::neighbors(black_box(&key)).unwrap())
    });

    group.finish();
}

fn benchmark_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    group.sample_size(10);

    for dataset_size in [1_000, 10_000, 50_000] {
        let facilities = generate_facilities(dataset_size);

        group.bench_with_input(
            BenchmarkId::new("build", dataset_size),
            &facilities,
            |b, facilities| {
                b.iter(|| {
                    FacilityIndex::build(black_box(facilities.clone()), &Config::default())
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn benchmark_search_methods(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_methods");

    let index = FacilityIndex::build(generate_facilities(10_000), &Config::default()).unwrap();
    let query = RadiusQuery::new(35.690, 139.700, 2_000.0);

    for method in SearchMethod::ALL {
        group.bench_with_input(
            BenchmarkId::new("radius_2km", method.as_str()),
            &method,
            |b, &method| b.iter(|| index.search(black_box(method), black_box(&query)).unwrap()),
        );
    }

    group.finish();
}

fn benchmark_radius_bands(c: &mut Criterion) {
    let mut group = c.benchmark_group("radius_bands");

    let index = FacilityIndex::build(generate_facilities(10_000), &Config::default()).unwrap();

    // One query per selector band, run with the method the selector picks
    for radius_m in [500.0, 1_500.0, 5_000.0, 20_000.0] {
        let method = geoseek::recommended_method(radius_m, index.len(), true);
        let query = RadiusQuery::new(35.690, 139.700, radius_m);

        group.bench_with_input(
            BenchmarkId::new(method.as_str(), radius_m as u64),
            &query,
            |b, query| b.iter(|| index.search(black_box(method), black_box(query)).unwrap()),
        );
    }

    group.finish();
}

fn benchmark_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(15));

    for dataset_size in [1_000, 10_000, 100_000] {
        let index =
            FacilityIndex::build(generate_facilities(dataset_size), &Config::default()).unwrap();
        let query = RadiusQuery::new(35.690, 139.700, 5_000.0);

        group.bench_with_input(
            BenchmarkId::new("direct", dataset_size),
            &query,
            |b, query| {
                b.iter(|| {
                    index
                        .search(black_box(SearchMethod::Direct), black_box(query))
                        .unwrap()
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("precise", dataset_size),
            &query,
            |b, query| {
                b.iter(|| {
                    index
                        .search(black_box(SearchMethod::Precise), black_box(query))
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_codec,
    benchmark_index_build,
    benchmark_search_methods,
    benchmark_radius_bands,
    benchmark_scaling
);

criterion_main!(benches);
