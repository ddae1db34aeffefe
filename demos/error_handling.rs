//! Error Handling Example for Brazil AQI
//!
//! This example demonstrates how calculation errors surface and how a batch
//! of measurements can be processed so that one bad reading does not discard
//! the rest.
//!
//! Run with: cargo run --example error_handling

use std::collections::BTreeMap;

use brazil_aqi::{AqiCalculator, AqiError, Pollutant, ReferenceTable};

/// Statistics for error tracking
#[derive(Debug, Default)]
struct ErrorStats {
    total_attempts: u32,
    successful: u32,
    out_of_domain_errors: u32,
    unknown_standard_errors: u32,
    other_errors: u32,
}

impl ErrorStats {
    fn record_success(&mut self) {
        self.total_attempts += 1;
        self.successful += 1;
    }

    fn record_error(&mut self, error: &AqiError) {
        self.total_attempts += 1;
        match error {
            AqiError::OutOfDomain { .. } => self.out_of_domain_errors += 1,
            AqiError::UnknownStandard(_) => self.unknown_standard_errors += 1,
            _ => self.other_errors += 1,
        }
    }

    fn success_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            (f64::from(self.successful) / f64::from(self.total_attempts)) * 100.0
        }
    }
}

fn main() {
    env_logger::init();

    println!("🌎 Brazil AQI - Error Handling Example\n");

    let mut calculator = AqiCalculator::default();
    let mut stats = ErrorStats::default();

    let readings = [
        (Pollutant::Pm10, 75.0, None),
        (Pollutant::Pm10, 750.0, None),
        (Pollutant::Pm25, -3.0, None),
        (Pollutant::O3, 150.0, Some("usa")),
        (Pollutant::No2, 400.0, Some("brazil")),
        (Pollutant::Co, f64::NAN, None),
    ];

    // Compute what we can; failed pollutants do not contribute
    for (pollutant, value, standard) in readings {
        match calculator.compute_sub_index(value, pollutant, standard) {
            Ok(sub_index) => {
                stats.record_success();
                println!("  ✅ {pollutant} {value}: {sub_index}");
            }
            Err(e) => {
                stats.record_error(&e);
                println!("  ❌ {pollutant} {value}: {e}");
            }
        }
    }

    println!();
    match calculator.compute_aqi(None, None) {
        Ok(aqi) => println!("📊 AQI of the valid readings: {aqi}"),
        Err(e) => println!("❌ {e}"),
    }

    println!();
    println!("📈 {stats:#?}");
    println!("   Success rate: {:.1}%", stats.success_rate());

    // A fresh calculator has nothing to aggregate
    println!();
    match AqiCalculator::default().compute_aqi(None, None) {
        Ok(aqi) => println!("✅ Unexpectedly succeeded: {aqi}"),
        Err(e) => println!("❌ Expected error: {e}"),
    }

    // Broken standard definitions are rejected when loading
    let broken = r#"{
        "name": "broken",
        "index": [[0, 50], [51, 100]],
        "pollutants": {"pm10_24h": [[0, 50], [40, 100]]}
    }"#;
    match ReferenceTable::from_json(broken) {
        Ok(_) => println!("✅ Unexpectedly loaded"),
        Err(e) => println!("❌ Expected error: {e}"),
    }

    let empty: BTreeMap<Pollutant, f64> = BTreeMap::new();
    match brazil_aqi::compute(&empty) {
        Ok(aqi) => println!("✅ Unexpectedly succeeded: {aqi}"),
        Err(e) => println!("❌ Expected error: {e}"),
    }
}
