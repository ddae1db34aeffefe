//! Breakpoint reference tables
//!
//! A reference table maps, for every pollutant of a standard, contiguous
//! concentration bands onto index bands. Tables are built once from a
//! [`RawStandard`] (usually read from JSON) and are immutable afterwards.
//!
//! The built-in default is the Brazilian IQAr table from CONAMA resolution
//! 491/2018:
//! <https://www.gov.br/mma/pt-br/centrais-de-conteudo/mma-guia-tecnico-qualidade-do-ar-pdf>

use std::collections::BTreeMap;
use std::io::Read;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{AqiError, Result};
use crate::pollutant::Pollutant;

/// Name of the built-in standard
pub const DEFAULT_STANDARD: &str = "brazil";

/// Tolerance used when checking band contiguity of decimal breakpoints
const CONTIGUITY_EPSILON: f64 = 1e-9;

/// Inclusive range `lower..=upper`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub lower: T,
    pub upper: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    #[must_use]
    pub fn new(lower: T, upper: T) -> Self {
        Self { lower, upper }
    }

    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.lower <= value && value <= self.upper
    }
}

impl<T> From<(T, T)> for Bounds<T> {
    fn from((lower, upper): (T, T)) -> Self {
        Self { lower, upper }
    }
}

/// One breakpoint band: a concentration range and the index range it maps to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub concentration: Bounds<f64>,
    pub index: Bounds<u32>,
}

impl Band {
    /// Top band without an upper breakpoint
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.concentration.upper.is_infinite()
    }
}

/// Serialized form of a standard definition
///
/// ```json
/// {
///   "name": "brazil",
///   "index": [[0, 40], [41, 80]],
///   "categories": ["Boa", "Moderada"],
///   "pollutants": { "pm10_24h": [[0, 50], [51, null]] }
/// }
/// ```
///
/// A `null` upper breakpoint leaves the top band open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStandard {
    pub name: String,
    /// Index bands shared by every pollutant, lowest first
    pub index: Vec<(u32, u32)>,
    /// Optional qualitative label per index band
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Concentration breakpoints per pollutant, aligned with `index`
    pub pollutants: BTreeMap<Pollutant, Vec<(f64, Option<f64>)>>,
}

fn closed(bands: &[(f64, f64)]) -> Vec<(f64, Option<f64>)> {
    bands
        .iter()
        .map(|&(lower, upper)| (lower, Some(upper)))
        .collect()
}

impl RawStandard {
    /// Brazilian IQAr breakpoints
    #[must_use]
    pub fn brazil() -> Self {
        let pollutants = BTreeMap::from([
            (
                Pollutant::Pm10,
                closed(&[
                    (0.0, 50.0),
                    (51.0, 100.0),
                    (101.0, 150.0),
                    (151.0, 250.0),
                    (251.0, 600.0),
                ]),
            ),
            (
                Pollutant::Pm25,
                closed(&[
                    (0.0, 25.0),
                    (26.0, 50.0),
                    (51.0, 75.0),
                    (76.0, 125.0),
                    (126.0, 300.0),
                ]),
            ),
            (
                Pollutant::O3,
                closed(&[
                    (0.0, 100.0),
                    (101.0, 130.0),
                    (131.0, 160.0),
                    (161.0, 200.0),
                    (201.0, 800.0),
                ]),
            ),
            (
                Pollutant::Co,
                closed(&[
                    (0.0, 9.0),
                    (9.1, 11.0),
                    (11.1, 13.0),
                    (13.1, 15.0),
                    (15.1, 50.0),
                ]),
            ),
            (
                Pollutant::No2,
                closed(&[
                    (0.0, 200.0),
                    (201.0, 240.0),
                    (241.0, 320.0),
                    (321.0, 1130.0),
                    (1131.0, 2260.0),
                ]),
            ),
            (
                Pollutant::So2,
                closed(&[
                    (0.0, 20.0),
                    (21.0, 40.0),
                    (41.0, 365.0),
                    (366.0, 800.0),
                    (801.0, 2620.0),
                ]),
            ),
        ]);

        Self {
            name: DEFAULT_STANDARD.to_string(),
            index: vec![(0, 40), (41, 80), (81, 120), (121, 200), (201, 400)],
            categories: ["Boa", "Moderada", "Ruim", "Muito Ruim", "Péssima"]
                .into_iter()
                .map(String::from)
                .collect(),
            pollutants,
        }
    }

    /// Check that the breakpoints form a usable table
    ///
    /// # Errors
    ///
    /// * `AqiError::InvalidTable` - describing the first rule that is violated
    pub fn validate(&self) -> Result<()> {
        if self.index.is_empty() {
            return Err(AqiError::InvalidTable("no index bands".into()));
        }
        if self.pollutants.is_empty() {
            return Err(AqiError::InvalidTable("no pollutants".into()));
        }
        if !self.categories.is_empty() && self.categories.len() != self.index.len() {
            return Err(AqiError::InvalidTable(format!(
                "{} categories for {} index bands",
                self.categories.len(),
                self.index.len()
            )));
        }

        let mut previous: Option<u32> = None;
        for (i, &(lower, upper)) in self.index.iter().enumerate() {
            if lower > upper {
                return Err(AqiError::InvalidTable(format!(
                    "index band {i} is reversed: {lower} > {upper}"
                )));
            }
            if previous.is_some_and(|prev_upper| lower < prev_upper) {
                return Err(AqiError::InvalidTable(format!(
                    "index band {i} starts below the previous band"
                )));
            }
            previous = Some(upper);
        }

        for (&pollutant, bands) in &self.pollutants {
            validate_bands(pollutant, bands, self.index.len())?;
        }

        Ok(())
    }
}

fn validate_bands(
    pollutant: Pollutant,
    bands: &[(f64, Option<f64>)],
    expected: usize,
) -> Result<()> {
    if bands.len() != expected {
        return Err(AqiError::invalid_table(
            pollutant,
            &format!("{} bands for {expected} index bands", bands.len()),
        ));
    }

    let step = pollutant.precision().step();
    let top = bands.len().saturating_sub(1);
    let mut previous: Option<f64> = None;

    for (i, &(lower, upper)) in bands.iter().enumerate() {
        let upper = match upper {
            Some(upper) => upper,
            None if i == top => f64::INFINITY,
            None => {
                return Err(AqiError::invalid_table(
                    pollutant,
                    "only the top band can be open",
                ));
            }
        };
        let open_top = i == top && upper == f64::INFINITY;
        if !lower.is_finite() || !(upper.is_finite() || open_top) {
            return Err(AqiError::invalid_table(pollutant, "non-finite breakpoint"));
        }
        if lower >= upper {
            return Err(AqiError::invalid_table(
                pollutant,
                &format!("empty band [{lower}, {upper}]"),
            ));
        }
        match previous {
            None if lower < 0.0 => {
                return Err(AqiError::invalid_table(
                    pollutant,
                    "first band starts below zero",
                ));
            }
            Some(prev_upper) if lower < prev_upper => {
                return Err(AqiError::invalid_table(
                    pollutant,
                    &format!("band [{lower}, {upper}] overlaps previous upper bound {prev_upper}"),
                ));
            }
            Some(prev_upper) if lower > prev_upper + step + CONTIGUITY_EPSILON => {
                return Err(AqiError::invalid_table(
                    pollutant,
                    &format!("gap between {prev_upper} and {lower}"),
                ));
            }
            _ => {}
        }
        previous = Some(upper);
    }

    Ok(())
}

/// Validated, immutable breakpoint table for one standard
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    name: String,
    index: Vec<Bounds<u32>>,
    categories: Vec<String>,
    pollutants: BTreeMap<Pollutant, Vec<Band>>,
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::brazil()
    }
}

impl ReferenceTable {
    /// The built-in Brazilian standard
    #[must_use]
    pub fn brazil() -> Self {
        Self::assemble(RawStandard::brazil())
    }

    /// Build a table from raw breakpoints
    ///
    /// # Errors
    ///
    /// * `AqiError::InvalidTable` - Breakpoints overlap, leave gaps or do not
    ///   line up with the index bands
    pub fn from_raw(raw: RawStandard) -> Result<Self> {
        raw.validate()?;
        Ok(Self::assemble(raw))
    }

    /// Parse and validate a JSON standard definition
    ///
    /// # Errors
    ///
    /// * `AqiError::Parse` - Text is not a valid standard definition
    /// * `AqiError::InvalidTable` - See [`ReferenceTable::from_raw`]
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_raw(serde_json::from_str(json)?)
    }

    /// Like [`ReferenceTable::from_json`], reading from any source
    ///
    /// # Errors
    ///
    /// See [`ReferenceTable::from_json`]
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Self::from_raw(serde_json::from_reader(reader)?)
    }

    fn assemble(raw: RawStandard) -> Self {
        let index: Vec<Bounds<u32>> = raw.index.into_iter().map(Bounds::from).collect();
        let pollutants = raw
            .pollutants
            .into_iter()
            .map(|(pollutant, bands)| {
                let bands = bands
                    .into_iter()
                    .zip(&index)
                    .map(|((lower, upper), &index)| Band {
                        concentration: Bounds::new(lower, upper.unwrap_or(f64::INFINITY)),
                        index,
                    })
                    .collect();
                (pollutant, bands)
            })
            .collect();

        Self {
            name: raw.name,
            index,
            categories: raw.categories,
            pollutants,
        }
    }

    /// Convert back into the serializable form
    #[must_use]
    pub fn to_raw(&self) -> RawStandard {
        RawStandard {
            name: self.name.clone(),
            index: self.index.iter().map(|b| (b.lower, b.upper)).collect(),
            categories: self.categories.clone(),
            pollutants: self
                .pollutants
                .iter()
                .map(|(&pollutant, bands)| {
                    let bands = bands
                        .iter()
                        .map(|band| {
                            let upper = (!band.is_open()).then_some(band.concentration.upper);
                            (band.concentration.lower, upper)
                        })
                        .collect();
                    (pollutant, bands)
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pollutants this standard has breakpoints for
    pub fn pollutants(&self) -> impl Iterator<Item = Pollutant> + '_ {
        self.pollutants.keys().copied()
    }

    /// Breakpoint bands of a pollutant, lowest first
    ///
    /// # Errors
    ///
    /// * `AqiError::MissingPollutant` - The standard does not cover the pollutant
    pub fn bands(&self, pollutant: Pollutant) -> Result<&[Band]> {
        self.pollutants
            .get(&pollutant)
            .map(Vec::as_slice)
            .ok_or_else(|| AqiError::MissingPollutant {
                standard: self.name.clone(),
                pollutant,
            })
    }

    /// Find the band whose concentration bounds contain `value`
    ///
    /// Bands are scanned in order, so a value equal to a shared breakpoint
    /// belongs to the band it closes.
    ///
    /// # Errors
    ///
    /// * `AqiError::MissingPollutant` - The standard does not cover the pollutant
    /// * `AqiError::OutOfDomain` - No band contains the value
    pub fn find_band(&self, pollutant: Pollutant, value: f64) -> Result<&Band> {
        let band = self
            .bands(pollutant)?
            .iter()
            .find(|band| band.concentration.contains(value))
            .ok_or(AqiError::OutOfDomain { pollutant, value })?;
        debug!(
            "{pollutant} {value} in [{}, {}] of {}",
            band.concentration.lower, band.concentration.upper, self.name
        );
        Ok(band)
    }

    /// Index bounds paired with the given concentration bounds
    ///
    /// # Errors
    ///
    /// * `AqiError::MissingPollutant` - The standard does not cover the pollutant
    /// * `AqiError::OutOfDomain` - The concentration bounds are not a band of this table
    pub fn index_bounds(
        &self,
        pollutant: Pollutant,
        concentration: Bounds<f64>,
    ) -> Result<Bounds<u32>> {
        self.bands(pollutant)?
            .iter()
            .find(|band| band.concentration == concentration)
            .map(|band| band.index)
            .ok_or(AqiError::OutOfDomain {
                pollutant,
                value: concentration.lower,
            })
    }

    /// Qualitative label for an index value, if the standard defines labels
    #[must_use]
    pub fn category(&self, aqi: u32) -> Option<&str> {
        self.index
            .iter()
            .position(|band| band.contains(aqi))
            .and_then(|i| self.categories.get(i))
            .map(String::as_str)
    }
}

/// Map a concentration onto its index band
///
/// `index.lower + floor((index.upper - index.lower) / (c.upper - c.lower) * (value - c.lower))`,
/// evaluated multiplication first. An open top band has no upper breakpoint
/// to interpolate against, so every value in it maps to `index.upper`.
///
/// # Panics
///
/// In debug builds, when a precondition that [`RawStandard::validate`] and
/// [`ReferenceTable::find_band`] establish does not hold:
///
/// * `index.lower > index.upper`
/// * `concentration` is empty
/// * `value` lies outside `concentration`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn interpolate(concentration: Bounds<f64>, index: Bounds<u32>, value: f64) -> u32 {
    debug_assert!(index.lower <= index.upper, "reversed index band");
    debug_assert!(
        concentration.lower < concentration.upper,
        "empty concentration band"
    );
    debug_assert!(concentration.contains(value), "value outside its band");

    if concentration.upper.is_infinite() {
        return index.upper;
    }

    let index_span = f64::from(index.upper.saturating_sub(index.lower));
    let offset =
        index_span * (value - concentration.lower) / (concentration.upper - concentration.lower);
    index.lower + offset.floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BRAZIL_JSON: &str = include_str!("../data/brazil.json");

    fn single_band(bands: &str, index: &str) -> String {
        format!(r#"{{"name":"test","index":{index},"pollutants":{{"pm10_24h":{bands}}}}}"#)
    }

    #[test]
    fn builtin_table_is_valid() {
        assert_eq!(RawStandard::brazil().validate(), Ok(()));
        let table = ReferenceTable::brazil();
        assert_eq!(table.name(), DEFAULT_STANDARD);
        assert_eq!(table.pollutants().count(), Pollutant::ALL.len());
    }

    #[test]
    fn data_file_matches_builtin() {
        let table = ReferenceTable::from_json(BRAZIL_JSON).unwrap();
        assert_eq!(table, ReferenceTable::brazil());
        assert_eq!(
            ReferenceTable::from_reader(BRAZIL_JSON.as_bytes()).unwrap(),
            table
        );
    }

    #[test]
    fn raw_round_trip() {
        let table = ReferenceTable::brazil();
        assert_eq!(table.to_raw(), RawStandard::brazil());
    }

    #[rstest]
    #[case(Pollutant::Pm10, 0.0, (0.0, 50.0))]
    #[case(Pollutant::Pm10, 50.0, (0.0, 50.0))]
    #[case(Pollutant::Pm10, 51.0, (51.0, 100.0))]
    #[case(Pollutant::Pm10, 600.0, (251.0, 600.0))]
    #[case(Pollutant::Co, 9.0, (0.0, 9.0))]
    #[case(Pollutant::Co, 9.1, (9.1, 11.0))]
    #[case(Pollutant::No2, 1131.0, (1131.0, 2260.0))]
    #[case(Pollutant::So2, 365.0, (41.0, 365.0))]
    fn find_band_cases(
        #[case] pollutant: Pollutant,
        #[case] value: f64,
        #[case] expected: (f64, f64),
    ) {
        let table = ReferenceTable::brazil();
        let band = table.find_band(pollutant, value).unwrap();
        assert_eq!(band.concentration, Bounds::from(expected));
    }

    #[rstest]
    #[case(Pollutant::Pm10, 601.0)]
    #[case(Pollutant::Pm25, -1.0)]
    #[case(Pollutant::Co, 50.1)]
    #[case(Pollutant::O3, f64::NAN)]
    fn find_band_out_of_domain(#[case] pollutant: Pollutant, #[case] value: f64) {
        let table = ReferenceTable::brazil();
        assert!(matches!(
            table.find_band(pollutant, value),
            Err(AqiError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn shared_breakpoint_belongs_to_closing_band() {
        let json = single_band("[[0,50],[50,100]]", "[[0,50],[51,100]]");
        let table = ReferenceTable::from_json(&json).unwrap();
        let band = table.find_band(Pollutant::Pm10, 50.0).unwrap();
        assert_eq!(band.concentration, Bounds::new(0.0, 50.0));
        assert_eq!(band.index, Bounds::new(0, 50));
    }

    #[test]
    fn missing_pollutant() {
        let json = single_band("[[0,50]]", "[[0,50]]");
        let table = ReferenceTable::from_json(&json).unwrap();
        assert_eq!(
            table.find_band(Pollutant::Co, 1.0),
            Err(AqiError::MissingPollutant {
                standard: "test".into(),
                pollutant: Pollutant::Co,
            })
        );
    }

    #[test]
    fn index_bounds_lookup() {
        let table = ReferenceTable::brazil();
        assert_eq!(
            table.index_bounds(Pollutant::O3, Bounds::new(131.0, 160.0)),
            Ok(Bounds::new(81, 120))
        );
        assert!(
            table
                .index_bounds(Pollutant::O3, Bounds::new(130.0, 160.0))
                .is_err()
        );
    }

    #[rstest]
    #[case::overlap("[[0,50],[40,100]]", "[[0,50],[51,100]]")]
    #[case::gap("[[0,50],[60,100]]", "[[0,50],[51,100]]")]
    #[case::empty_band("[[0,0],[1,100]]", "[[0,50],[51,100]]")]
    #[case::negative_start("[[-1,50],[51,100]]", "[[0,50],[51,100]]")]
    #[case::count_mismatch("[[0,50]]", "[[0,50],[51,100]]")]
    #[case::reversed_index("[[0,50],[51,100]]", "[[50,0],[51,100]]")]
    #[case::decreasing_index("[[0,50],[51,100]]", "[[0,50],[20,100]]")]
    #[case::no_index("[]", "[]")]
    #[case::open_below_top("[[0,null],[51,100]]", "[[0,50],[51,100]]")]
    fn invalid_tables(#[case] bands: &str, #[case] index: &str) {
        let json = single_band(bands, index);
        assert!(matches!(
            ReferenceTable::from_json(&json),
            Err(AqiError::InvalidTable(_))
        ));
    }

    #[rstest]
    #[case(51.0)]
    #[case(601.0)]
    #[case(1e6)]
    fn open_top_band_saturates(#[case] value: f64) {
        let json = single_band("[[0,50],[51,null]]", "[[0,50],[51,100]]");
        let table = ReferenceTable::from_json(&json).unwrap();
        let band = table.find_band(Pollutant::Pm10, value).unwrap();
        assert!(band.is_open());
        assert_eq!(band.index, Bounds::new(51, 100));
        assert_eq!(interpolate(band.concentration, band.index, value), 100);
    }

    #[test]
    fn infinite_top_breakpoint_is_open() {
        let mut raw = RawStandard::brazil();
        let bands = raw.pollutants.get_mut(&Pollutant::Pm10).unwrap();
        bands[4] = (251.0, Some(f64::INFINITY));

        let table = ReferenceTable::from_raw(raw).unwrap();
        let band = table.find_band(Pollutant::Pm10, 601.0).unwrap();
        assert!(band.is_open());
        assert_eq!(band.index, Bounds::new(201, 400));
        assert_eq!(
            table.to_raw().pollutants[&Pollutant::Pm10][4],
            (251.0, None)
        );
        assert!(matches!(
            table.find_band(Pollutant::Pm10, -1.0),
            Err(AqiError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn category_count_must_match() {
        let mut raw = RawStandard::brazil();
        raw.categories.pop();
        assert!(matches!(
            ReferenceTable::from_raw(raw),
            Err(AqiError::InvalidTable(_))
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            ReferenceTable::from_json("{\"name\": 1}"),
            Err(AqiError::Parse(_))
        ));
        let unknown_pollutant = single_band("[[0,50]]", "[[0,50]]").replace("pm10", "pm1");
        assert!(matches!(
            ReferenceTable::from_json(&unknown_pollutant),
            Err(AqiError::Parse(_))
        ));
    }

    #[rstest]
    #[case(0, Some("Boa"))]
    #[case(40, Some("Boa"))]
    #[case(41, Some("Moderada"))]
    #[case(120, Some("Ruim"))]
    #[case(200, Some("Muito Ruim"))]
    #[case(400, Some("Péssima"))]
    #[case(401, None)]
    fn categories(#[case] aqi: u32, #[case] expected: Option<&str>) {
        assert_eq!(ReferenceTable::brazil().category(aqi), expected);
    }

    #[rstest]
    #[case((0.0, 50.0), (0, 50), 25.0, 25)]
    #[case((0.0, 50.0), (0, 40), 25.0, 20)]
    #[case((0.0, 50.0), (0, 40), 50.0, 40)]
    #[case((51.0, 100.0), (41, 80), 51.0, 41)]
    #[case((51.0, 100.0), (41, 80), 75.0, 60)]
    #[case((251.0, 600.0), (201, 400), 600.0, 400)]
    #[case((9.1, 11.0), (41, 80), 10.0, 59)]
    #[case((251.0, f64::INFINITY), (201, 400), 251.0, 400)]
    #[case((251.0, f64::INFINITY), (201, 400), 10_000.0, 400)]
    fn interpolate_cases(
        #[case] concentration: (f64, f64),
        #[case] index: (u32, u32),
        #[case] value: f64,
        #[case] expected: u32,
    ) {
        assert_eq!(
            interpolate(concentration.into(), index.into(), value),
            expected
        );
    }
}
