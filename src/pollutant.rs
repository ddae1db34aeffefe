//! Pollutant identifiers and concentration normalization
//!
//! Each pollutant is reported with a fixed numeric precision: whole numbers for
//! particulate matter and gases measured in µg/m³, one decimal place for carbon
//! monoxide in ppm. Inputs that do not match are rounded and a
//! [`PrecisionWarning`] is emitted through `log` and returned to the caller.

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

/// Pollutants covered by the reference standards
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    /// Particulate matter up to 10µm, 24h average
    #[serde(rename = "pm10_24h")]
    Pm10,
    /// Particulate matter up to 2.5µm, 24h average
    #[serde(rename = "pm25_24h")]
    Pm25,
    /// Ozone, 8h average
    #[serde(rename = "o3_8h")]
    O3,
    /// Carbon monoxide, 8h average
    #[serde(rename = "co_8h")]
    Co,
    /// Nitrogen dioxide, 1h average
    #[serde(rename = "no2_1h")]
    No2,
    /// Sulfur dioxide, 24h average
    #[serde(rename = "so2_24h")]
    So2,
}

/// Concentration unit of a pollutant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    /// Micrograms per cubic meter
    MicrogramsPerCubicMeter,
    /// Parts per million
    PartsPerMillion,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MicrogramsPerCubicMeter => f.write_str("µg/m³"),
            Self::PartsPerMillion => f.write_str("ppm"),
        }
    }
}

/// Expected numeric precision of a reported concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    /// Whole numbers
    Integer,
    /// One digit after the decimal point
    OneDecimal,
}

impl Precision {
    /// Smallest representable difference between two reported values
    #[must_use]
    pub fn step(self) -> f64 {
        match self {
            Self::Integer => 1.0,
            Self::OneDecimal => 0.1,
        }
    }
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Self::Pm10,
        Self::Pm25,
        Self::O3,
        Self::Co,
        Self::No2,
        Self::So2,
    ];

    /// Identifier used in configuration files and logs
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Pm10 => "pm10_24h",
            Self::Pm25 => "pm25_24h",
            Self::O3 => "o3_8h",
            Self::Co => "co_8h",
            Self::No2 => "no2_1h",
            Self::So2 => "so2_24h",
        }
    }

    #[must_use]
    pub fn unit(self) -> Unit {
        match self {
            Self::Co => Unit::PartsPerMillion,
            _ => Unit::MicrogramsPerCubicMeter,
        }
    }

    #[must_use]
    pub fn precision(self) -> Precision {
        match self {
            Self::Co => Precision::OneDecimal,
            _ => Precision::Integer,
        }
    }

    /// Length of the averaging window the concentration refers to
    #[must_use]
    pub fn averaging_hours(self) -> u8 {
        match self {
            Self::Pm10 | Self::Pm25 | Self::So2 => 24,
            Self::O3 | Self::Co => 8,
            Self::No2 => 1,
        }
    }

    /// Round a concentration to this pollutant's reporting precision
    ///
    /// Whole-number pollutants are rounded half-to-even. Carbon monoxide is
    /// rounded to one decimal place; a whole-number CO input is kept as is but
    /// flagged, since CO readings are expected to be reported pre-rounded to
    /// one decimal.
    ///
    /// # Example
    ///
    /// ```rust
    /// use brazil_aqi::Pollutant;
    ///
    /// assert_eq!(Pollutant::Pm25.normalize(12.5).value, 12.0);
    /// assert_eq!(Pollutant::Co.normalize(9.1).value, 9.1);
    /// ```
    #[must_use]
    pub fn normalize(self, value: f64) -> Normalized {
        if !value.is_finite() {
            return Normalized {
                value,
                warning: None,
            };
        }

        let (normalized, warning) = match self.precision() {
            Precision::OneDecimal if value.fract() == 0.0 => (
                value,
                Some(PrecisionWarning::WholeNumber {
                    pollutant: self,
                    value,
                }),
            ),
            Precision::OneDecimal => {
                let rounded = (value * 10.0).round_ties_even() / 10.0;
                let warning = (rounded != value).then_some(PrecisionWarning::Rounded {
                    pollutant: self,
                    value,
                    rounded,
                });
                (rounded, warning)
            }
            Precision::Integer if value.fract() != 0.0 => {
                let rounded = value.round_ties_even();
                (
                    rounded,
                    Some(PrecisionWarning::Rounded {
                        pollutant: self,
                        value,
                        rounded,
                    }),
                )
            }
            Precision::Integer => (value, None),
        };

        if let Some(warning) = &warning {
            warn!("{warning}");
        }

        Normalized {
            value: normalized,
            warning,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Pollutant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| format!("unknown pollutant: {s}"))
    }
}

/// Diagnostic raised when an input does not match the expected precision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrecisionWarning {
    /// Value was rounded to the pollutant's precision
    Rounded {
        pollutant: Pollutant,
        value: f64,
        rounded: f64,
    },
    /// A one-decimal pollutant was given as a whole number
    WholeNumber { pollutant: Pollutant, value: f64 },
}

impl fmt::Display for PrecisionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rounded {
                pollutant,
                value,
                rounded,
            } => write!(
                f,
                "{pollutant} concentration {value} has unexpected precision, rounded to {rounded}"
            ),
            Self::WholeNumber { pollutant, value } => write!(
                f,
                "{pollutant} expects one decimal place, got whole number {value}"
            ),
        }
    }
}

/// A concentration adjusted to its pollutant's precision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub value: f64,
    pub warning: Option<PrecisionWarning>,
}
