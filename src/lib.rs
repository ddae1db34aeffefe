//! Air Quality Index calculation
//!
//! This crate computes an AQI from pollutant concentrations by piecewise-linear
//! interpolation against a breakpoint reference table:
//! - Concentrations are rounded to each pollutant's reporting precision
//! - The concentration band containing the value selects an index band
//! - The position inside the concentration band maps linearly onto the index band
//! - The aggregate AQI is the highest sub-index
//!
//! The built-in standard is the Brazilian IQAr (CONAMA 491/2018). Other
//! standards can be loaded from JSON with [`ReferenceTable::from_json`].
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use brazil_aqi::{compute, Pollutant, ReferenceTable};
//!
//! let values = BTreeMap::from([
//!     (Pollutant::Pm10, 53.0),
//!     (Pollutant::O3, 128.0),
//!     (Pollutant::Co, 1.2),
//! ]);
//! let aqi = compute(&values).unwrap();
//! assert_eq!(aqi, 77);
//! assert_eq!(ReferenceTable::brazil().category(aqi), Some("Moderada"));
//! ```

pub mod calculator;
pub mod error;
pub mod pollutant;
pub mod reference;

use std::collections::BTreeMap;

pub use calculator::{AqiCalculator, PollutantState, Stage};
pub use error::{AqiError, Result};
pub use pollutant::{Normalized, Pollutant, Precision, PrecisionWarning, Unit};
pub use reference::{Band, Bounds, DEFAULT_STANDARD, RawStandard, ReferenceTable};

/// Compute the aggregate AQI of a set of concentrations against the default standard
///
/// # Arguments
///
/// * `values` - Concentration per pollutant, in the pollutant's [`Unit`]
///
/// # Returns
///
/// * `Ok(u32)` - Highest sub-index among the supplied pollutants
/// * `Err(AqiError)` - Computation failed
///
/// # Errors
///
/// * `AqiError::InsufficientData` - `values` is empty
/// * `AqiError::OutOfDomain` - A concentration is outside every breakpoint band
pub fn compute(values: &BTreeMap<Pollutant, f64>) -> Result<u32> {
    AqiCalculator::default().compute_aqi(Some(values), Some(DEFAULT_STANDARD))
}
