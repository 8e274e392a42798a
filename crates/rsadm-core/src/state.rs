//! Concentration vectors.
//!
//! A [`ConcentrationVector`] maps every component of a phase to a concentration.
//! The ordering is shared (via an [`Arc`]) with the registry-derived layout so that
//! positional access into ODE state vectors and stoichiometric matrices is cheap,
//! while lookups by id still fail loudly with [`AdmError::MissingComponent`].

use crate::errors::{AdmError, AdmResult};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered set of component ids shared between vectors of the same phase.
pub type Layout = Arc<IndexSet<String>>;

/// Build a layout from a list of ids.
pub fn layout<S: AsRef<str>>(ids: &[S]) -> Layout {
    Arc::new(ids.iter().map(|s| s.as_ref().to_string()).collect())
}

/// A negative concentration that was reset to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClampEvent {
    pub component: String,
    /// Value before clamping
    pub value: f64,
    /// unit: d
    pub time: f64,
}

/// A single entry of an initial concentration record.
///
/// Records produced by the state loader either hold bare numbers or
/// `[value, unit, description]` triples; only the value is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConcentrationEntry {
    Value(f64),
    Described(f64, String, String),
}

impl ConcentrationEntry {
    pub fn value(&self) -> f64 {
        match self {
            ConcentrationEntry::Value(v) => *v,
            ConcentrationEntry::Described(v, _, _) => *v,
        }
    }
}

impl From<f64> for ConcentrationEntry {
    fn from(value: f64) -> Self {
        ConcentrationEntry::Value(value)
    }
}

/// Concentrations keyed by component id, as supplied by the state loader.
pub type ConcentrationRecord = IndexMap<String, ConcentrationEntry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationVector {
    layout: Layout,
    values: Vec<f64>,
}

impl ConcentrationVector {
    /// A vector of zeros over the given layout.
    pub fn zeros(layout: Layout) -> Self {
        let values = vec![0.0; layout.len()];
        Self { layout, values }
    }

    /// Wrap existing values.
    ///
    /// # Errors
    ///
    /// Fails if the number of values does not match the layout.
    pub fn from_values(layout: Layout, values: Vec<f64>) -> AdmResult<Self> {
        if values.len() != layout.len() {
            return Err(AdmError::InvalidConfiguration(format!(
                "expected {} concentrations, got {}",
                layout.len(),
                values.len()
            )));
        }
        Ok(Self { layout, values })
    }

    /// Build a vector from a loader record.
    ///
    /// Components absent from the record start at zero. Ids that are not part of the
    /// layout and negative values are rejected.
    pub fn from_record(layout: Layout, record: &ConcentrationRecord) -> AdmResult<Self> {
        let mut vector = Self::zeros(layout);
        for (id, entry) in record {
            let value = entry.value();
            if !value.is_finite() || value < 0.0 {
                return Err(AdmError::InvalidConfiguration(format!(
                    "initial concentration of '{}' must be finite and non-negative, got {}",
                    id, value
                )));
            }
            let index = vector
                .index_of(id)
                .ok_or_else(|| AdmError::UnknownComponent(id.clone()))?;
            vector.values[index] = value;
        }
        for id in vector.layout.iter() {
            if !record.contains_key(id) {
                debug!(component = %id, "No initial value supplied; starting at zero");
            }
        }
        Ok(vector)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.layout.get_index_of(id)
    }

    /// Concentration of a component.
    ///
    /// # Errors
    ///
    /// Returns [`AdmError::MissingComponent`] if the component is not part of this vector.
    pub fn get(&self, id: &str) -> AdmResult<f64> {
        self.index_of(id)
            .map(|i| self.values[i])
            .ok_or_else(|| AdmError::MissingComponent(id.to_string()))
    }

    pub fn set(&mut self, id: &str, value: f64) -> AdmResult<()> {
        let index = self
            .index_of(id)
            .ok_or_else(|| AdmError::MissingComponent(id.to_string()))?;
        self.values[index] = value;
        Ok(())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.layout.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, f64)> {
        self.layout.iter().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy with negative values replaced by zero, without recording anything.
    ///
    /// Used for rate evaluation on intermediate integrator stages.
    pub fn non_negative(&self) -> Self {
        Self {
            layout: self.layout.clone(),
            values: self.values.iter().map(|v| v.max(0.0)).collect(),
        }
    }

    /// Reset negative values to zero, reporting every reset.
    pub fn clamp_negative(&mut self, time: f64) -> Vec<ClampEvent> {
        let mut events = Vec::new();
        for (id, value) in self.layout.iter().zip(self.values.iter_mut()) {
            if *value < 0.0 {
                warn!(
                    component = %id,
                    value = *value,
                    time,
                    "Negative concentration clamped to zero"
                );
                events.push(ClampEvent {
                    component: id.clone(),
                    value: *value,
                    time,
                });
                *value = 0.0;
            }
        }
        events
    }

    /// Convert into an id-keyed map.
    pub fn to_map(&self) -> IndexMap<String, f64> {
        self.iter().map(|(id, v)| (id.clone(), v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector() -> ConcentrationVector {
        ConcentrationVector::from_values(layout(&["S_su", "S_ac", "X_ac"]), vec![0.1, -1e-9, 0.5])
            .unwrap()
    }

    #[test]
    fn test_missing_component_is_an_error() {
        let v = vector();
        assert_eq!(
            v.get("S_pro").unwrap_err(),
            AdmError::MissingComponent("S_pro".to_string())
        );
        assert_eq!(v.get("X_ac").unwrap(), 0.5);
    }

    #[test]
    fn test_clamp_negative_records_events() {
        let mut v = vector();
        let events = v.clamp_negative(3.5);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].component, "S_ac");
        assert_eq!(events[0].time, 3.5);
        assert_eq!(v.get("S_ac").unwrap(), 0.0);
        assert!(v.values().iter().all(|x| *x >= 0.0));
    }

    #[test]
    fn test_non_negative_leaves_original_untouched() {
        let v = vector();
        let clean = v.non_negative();
        assert_eq!(clean.get("S_ac").unwrap(), 0.0);
        assert!(v.get("S_ac").unwrap() < 0.0);
    }

    #[test]
    fn test_record_accepts_bare_values_and_triples() {
        let record: ConcentrationRecord = serde_json::from_str(
            r#"{"S_su": 0.012, "S_ac": [0.2, "kg COD/m3", "acetate"]}"#,
        )
        .unwrap();
        let v = ConcentrationVector::from_record(layout(&["S_su", "S_ac", "X_ac"]), &record)
            .unwrap();
        assert_eq!(v.values(), &[0.012, 0.2, 0.0]);
    }

    #[test]
    fn test_record_rejects_unknown_ids() {
        let mut record = ConcentrationRecord::new();
        record.insert("S_unknown".to_string(), 1.0.into());
        let err = ConcentrationVector::from_record(layout(&["S_su"]), &record).unwrap_err();
        assert_eq!(err, AdmError::UnknownComponent("S_unknown".to_string()));
    }

    #[test]
    fn test_record_rejects_negative_values() {
        let mut record = ConcentrationRecord::new();
        record.insert("S_su".to_string(), (-0.1).into());
        assert!(ConcentrationVector::from_record(layout(&["S_su"]), &record).is_err());
    }
}
