//! Basic Usage Example for Brazil AQI
//!
//! This example demonstrates the core functionality of the brazil-aqi library,
//! including per-pollutant sub-indices, the aggregate index, caching and
//! loading a standard from JSON.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_usage

use std::collections::BTreeMap;

use brazil_aqi::{AqiCalculator, Pollutant, ReferenceTable, compute};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("🌎 Brazil AQI - Basic Usage Example\n");

    // Example 1: Sub-index per pollutant
    println!("🧪 Example 1: Sub-indices");
    println!("========================");

    let mut calculator = AqiCalculator::default();
    let readings = [
        (Pollutant::Pm10, 75.0),
        (Pollutant::Pm25, 60.0),
        (Pollutant::O3, 150.0),
        (Pollutant::Co, 10.1),
        (Pollutant::No2, 400.0),
        (Pollutant::So2, 500.0),
    ];

    for (pollutant, value) in readings {
        let sub_index = calculator.get_sub_index(value, pollutant, None)?;
        println!(
            "  {:<9} {:>7} {:<6} -> iAQI {:>3} ({})",
            pollutant.id(),
            value,
            pollutant.unit().to_string(),
            sub_index,
            category(calculator.table(), sub_index)
        );
    }

    println!();

    // Example 2: Aggregate from cached sub-indices
    println!("📊 Example 2: Aggregate AQI");
    println!("===========================");

    let aqi = calculator.get_aqi(None, None)?;
    println!(
        "  AQI from cached sub-indices: {aqi} ({})",
        category(calculator.table(), aqi)
    );

    let values = BTreeMap::from([(Pollutant::Pm10, 53.0), (Pollutant::O3, 128.0)]);
    let aqi = compute(&values)?;
    println!("  AQI of {values:?}: {aqi}");

    println!();

    // Example 3: Precision adjustments
    println!("🔧 Example 3: Precision Adjustments");
    println!("===================================");

    for (pollutant, value) in [
        (Pollutant::Pm10, 50.5),
        (Pollutant::Co, 9.0),
        (Pollutant::Co, 9.14),
    ] {
        let normalized = pollutant.normalize(value);
        match normalized.warning {
            Some(warning) => println!("  ⚠️  {warning}"),
            None => println!("  ✅ {pollutant} {value} already has the expected precision"),
        }
    }

    println!();

    // Example 4: Caching
    println!("💾 Example 4: Caching");
    println!("=====================");

    let scans = calculator.table_scans();
    calculator.get_sub_index(75.0, Pollutant::Pm10, None)?;
    println!(
        "  Same value again: {} new scans",
        calculator.table_scans() - scans
    );
    calculator.get_sub_index(120.0, Pollutant::Pm10, None)?;
    println!(
        "  New value: {} new scans, stage {:?}",
        calculator.table_scans() - scans,
        calculator.state(Pollutant::Pm10).map(|s| s.stage())
    );

    println!();

    // Example 5: Custom standard
    println!("📄 Example 5: Custom Standard");
    println!("=============================");

    let table = ReferenceTable::from_json(include_str!("../data/brazil.json"))?;
    let mut custom = AqiCalculator::new(table);
    let sub_index = custom.get_sub_index(97.0, Pollutant::Pm10, Some("brazil"))?;
    println!(
        "  {} loaded from JSON: pm10 97 -> {sub_index}",
        custom.table().name()
    );

    Ok(())
}

fn category(table: &ReferenceTable, aqi: u32) -> &str {
    table.category(aqi).unwrap_or("unclassified")
}
