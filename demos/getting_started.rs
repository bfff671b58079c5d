use geoseek::{Config, Facility, IndexStore, MethodChoice, RadiusQuery, SearchMethod};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug to see build statistics)
    env_logger::init();

    println!("=== geoseek - Getting Started ===\n");

    // === BUILD AND PUBLISH AN INDEX ===
    println!("1. Building an index");
    println!("--------------------");

    let facilities = vec![
        Facility::new(1, "Shinjuku Clinic", "3-1-1 Shinjuku", 35.6905, 139.7005),
        Facility::new(2, "Yoyogi Clinic", "1-2-3 Yoyogi", 35.6830, 139.7020),
        Facility::new(3, "Nakano Library", "4-5-6 Nakano", 35.7074, 139.6638),
        Facility::new(4, "Ueno Depot", "7-8-9 Ueno", 35.7141, 139.7774),
    ];

    let store = IndexStore::new();
    let index = store.rebuild(facilities, &Config::default())?;
    println!("   Indexed {} facilities", index.len());

    let info = index.info();
    println!(
        "   {} geokey cells, {} grid cells, ~{} KiB\n",
        info.cell_count,
        info.grid_cell_count,
        info.memory_estimate / 1024
    );

    // === RADIUS SEARCH ===
    println!("2. Radius search");
    println!("----------------");

    let query = RadiusQuery::new(35.6895, 139.6917, 2_000.0);
    let hits = store.search(&query, MethodChoice::Auto)?;
    println!("   {} facilities within 2 km of Shinjuku station:", hits.len());
    for hit in &hits {
        println!("     - {} ({:.0} m)", hit.facility.name, hit.distance_m);
    }
    println!();

    // === NAME FILTER ===
    println!("3. Name filtering");
    println!("-----------------");

    let query = RadiusQuery::new(35.6895, 139.6917, 5_000.0).with_name_filter("clinic");
    let hits = store.search(&query, MethodChoice::Fixed(SearchMethod::Precise))?;
    println!("   {} clinics within 5 km:", hits.len());
    for hit in &hits {
        println!("     - {} ({:.0} m)", hit.facility.name, hit.distance_m);
    }
    println!();

    // === STRATEGY COMPARISON ===
    println!("4. Comparing strategies");
    println!("-----------------------");

    let reports = index.compare_all_methods(35.6895, 139.6917, 2_000.0)?;
    for report in &reports {
        println!(
            "   {:<13} {:>3} results in {:?}",
            report.method.to_string(),
            report.result_count,
            report.elapsed
        );
    }

    println!("\n=== Done ===");
    Ok(())
}
