//! Stateful AQI calculator
//!
//! [`AqiCalculator`] owns one [`ReferenceTable`] and remembers, per pollutant,
//! the last concentration it was given together with every intermediate
//! result. Asking again with the same concentration is answered from that
//! slot; a different concentration replaces it.

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::Serialize;

use crate::error::{AqiError, Result};
use crate::pollutant::{Normalized, Pollutant};
use crate::reference::{Bounds, ReferenceTable, interpolate};

/// How far the computation for a pollutant slot has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
    /// No band has been found for the current value yet
    Uncomputed,
    /// Concentration bounds are known
    BoundsFound,
    /// Index bounds paired with the concentration bounds are known
    IndexBoundsFound,
    /// Sub-index has been interpolated
    SubIndexComputed,
}

/// Cached computation for the last concentration supplied for a pollutant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutantState {
    /// Concentration as supplied by the caller, used as the cache key
    pub input: f64,
    /// Concentration after precision adjustment
    pub normalized: f64,
    pub concentration_bounds: Option<Bounds<f64>>,
    pub index_bounds: Option<Bounds<u32>>,
    pub sub_index: Option<u32>,
}

impl PollutantState {
    fn new(input: f64, normalized: f64) -> Self {
        Self {
            input,
            normalized,
            concentration_bounds: None,
            index_bounds: None,
            sub_index: None,
        }
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        match (self.concentration_bounds, self.index_bounds, self.sub_index) {
            (_, _, Some(_)) => Stage::SubIndexComputed,
            (_, Some(_), None) => Stage::IndexBoundsFound,
            (Some(_), None, None) => Stage::BoundsFound,
            (None, None, None) => Stage::Uncomputed,
        }
    }
}

/// AQI calculator bound to a single reference standard
///
/// Every operation takes an optional standard name. `None` selects the bound
/// table; any other name than the bound table's yields
/// [`AqiError::UnknownStandard`].
///
/// Not synchronized: use one calculator per batch of measurements.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use brazil_aqi::{AqiCalculator, Pollutant};
///
/// let mut calculator = AqiCalculator::default();
/// assert_eq!(calculator.compute_sub_index(75.0, Pollutant::Pm10, None).unwrap(), 60);
///
/// let values = BTreeMap::from([(Pollutant::Pm10, 53.0), (Pollutant::O3, 128.0)]);
/// assert_eq!(calculator.compute_aqi(Some(&values), Some("brazil")).unwrap(), 77);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AqiCalculator {
    table: ReferenceTable,
    states: BTreeMap<Pollutant, PollutantState>,
    scans: u64,
}

impl AqiCalculator {
    #[must_use]
    pub fn new(table: ReferenceTable) -> Self {
        Self {
            table,
            states: BTreeMap::new(),
            scans: 0,
        }
    }

    #[must_use]
    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// Cached state of a pollutant, if it has been given a concentration
    #[must_use]
    pub fn state(&self, pollutant: Pollutant) -> Option<&PollutantState> {
        self.states.get(&pollutant)
    }

    /// Number of breakpoint scans performed; cache hits do not scan
    #[must_use]
    pub fn table_scans(&self) -> u64 {
        self.scans
    }

    /// Forget every cached pollutant state
    pub fn reset(&mut self) {
        self.states.clear();
    }

    fn check_standard(&self, standard: Option<&str>) -> Result<()> {
        match standard {
            Some(name) if name != self.table.name() => {
                Err(AqiError::UnknownStandard(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Slot for `pollutant`, replaced by a fresh one when `value` differs from its key
    fn slot(
        states: &mut BTreeMap<Pollutant, PollutantState>,
        pollutant: Pollutant,
        value: f64,
    ) -> &mut PollutantState {
        let state = states
            .entry(pollutant)
            .or_insert_with(|| PollutantState::new(value, pollutant.normalize(value).value));
        if state.input != value {
            debug!(
                "{pollutant} changed from {} to {value}, invalidating",
                state.input
            );
            *state = PollutantState::new(value, pollutant.normalize(value).value);
        }
        state
    }

    /// Adjust a concentration to the precision the standard expects
    ///
    /// # Errors
    ///
    /// * `AqiError::UnknownStandard` - `standard` is not the bound table
    pub fn normalize(
        &self,
        value: f64,
        pollutant: Pollutant,
        standard: Option<&str>,
    ) -> Result<Normalized> {
        self.check_standard(standard)?;
        Ok(pollutant.normalize(value))
    }

    /// Concentration band containing the normalized value
    ///
    /// # Errors
    ///
    /// * `AqiError::UnknownStandard` - `standard` is not the bound table
    /// * `AqiError::MissingPollutant` - The table does not cover the pollutant
    /// * `AqiError::OutOfDomain` - No band contains the normalized value
    pub fn find_concentration_bounds(
        &mut self,
        value: f64,
        pollutant: Pollutant,
        standard: Option<&str>,
    ) -> Result<Bounds<f64>> {
        self.check_standard(standard)?;
        let state = Self::slot(&mut self.states, pollutant, value);
        if let Some(bounds) = state.concentration_bounds {
            trace!("{pollutant} {value}: cached concentration bounds");
            return Ok(bounds);
        }

        self.scans += 1;
        let bounds = self
            .table
            .find_band(pollutant, state.normalized)?
            .concentration;
        state.concentration_bounds = Some(bounds);
        Ok(bounds)
    }

    /// Index band paired with the concentration band of the value
    ///
    /// # Errors
    ///
    /// See [`AqiCalculator::find_concentration_bounds`]
    pub fn find_index_bounds(
        &mut self,
        value: f64,
        pollutant: Pollutant,
        standard: Option<&str>,
    ) -> Result<Bounds<u32>> {
        let concentration = self.find_concentration_bounds(value, pollutant, standard)?;
        let state = Self::slot(&mut self.states, pollutant, value);
        if let Some(bounds) = state.index_bounds {
            trace!("{pollutant} {value}: cached index bounds");
            return Ok(bounds);
        }

        let bounds = self.table.index_bounds(pollutant, concentration)?;
        state.index_bounds = Some(bounds);
        Ok(bounds)
    }

    /// Sub-index (iAQI) of a single pollutant
    ///
    /// # Errors
    ///
    /// See [`AqiCalculator::find_concentration_bounds`]
    pub fn compute_sub_index(
        &mut self,
        value: f64,
        pollutant: Pollutant,
        standard: Option<&str>,
    ) -> Result<u32> {
        let concentration = self.find_concentration_bounds(value, pollutant, standard)?;
        let index = self.find_index_bounds(value, pollutant, standard)?;
        let state = Self::slot(&mut self.states, pollutant, value);
        if let Some(sub_index) = state.sub_index {
            trace!("{pollutant} {value}: cached sub-index {sub_index}");
            return Ok(sub_index);
        }

        let sub_index = interpolate(concentration, index, state.normalized);
        debug!("{pollutant} {value}: sub-index {sub_index}");
        state.sub_index = Some(sub_index);
        Ok(sub_index)
    }

    /// Same as [`AqiCalculator::compute_sub_index`]
    ///
    /// # Errors
    ///
    /// See [`AqiCalculator::find_concentration_bounds`]
    pub fn get_sub_index(
        &mut self,
        value: f64,
        pollutant: Pollutant,
        standard: Option<&str>,
    ) -> Result<u32> {
        self.compute_sub_index(value, pollutant, standard)
    }

    /// Aggregate AQI: the highest sub-index
    ///
    /// With concentrations, every pollutant is computed against `standard`.
    /// Without (or with an empty map), the sub-indices already cached on this
    /// calculator are used.
    ///
    /// # Errors
    ///
    /// * `AqiError::InsufficientData` - No concentrations and nothing cached
    /// * Any error of [`AqiCalculator::compute_sub_index`]
    pub fn compute_aqi(
        &mut self,
        values: Option<&BTreeMap<Pollutant, f64>>,
        standard: Option<&str>,
    ) -> Result<u32> {
        self.check_standard(standard)?;

        match values {
            Some(values) if !values.is_empty() => {
                let mut aqi = 0;
                for (&pollutant, &value) in values {
                    aqi = aqi.max(self.compute_sub_index(value, pollutant, standard)?);
                }
                debug!("AQI {aqi} from {} pollutants", values.len());
                Ok(aqi)
            }
            _ => self
                .states
                .values()
                .filter_map(|state| state.sub_index)
                .max()
                .ok_or(AqiError::InsufficientData),
        }
    }

    /// Same as [`AqiCalculator::compute_aqi`]
    ///
    /// # Errors
    ///
    /// See [`AqiCalculator::compute_aqi`]
    pub fn get_aqi(
        &mut self,
        values: Option<&BTreeMap<Pollutant, f64>>,
        standard: Option<&str>,
    ) -> Result<u32> {
        self.compute_aqi(values, standard)
    }
}
