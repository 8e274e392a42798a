//! Iron Parameters
//!
//! Abiotic reduction of ferric iron by dissolved hydrogen and by sulfide. Both
//! reactions are second-order mass action; sulfide is oxidised to elemental
//! sulfur.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IronParameters {
    /// Fe(III) reduction by hydrogen
    /// unit: m^3/(kg COD d)
    /// default: 1000.0
    pub k_fe3_h2: f64,
    /// Fe(III) reduction by total sulfide
    /// unit: m^3/(kmol d)
    /// default: 1000.0
    pub k_fe3_hs: f64,
}

impl Default for IronParameters {
    fn default() -> Self {
        Self {
            k_fe3_h2: 1000.0,
            k_fe3_hs: 1000.0,
        }
    }
}
