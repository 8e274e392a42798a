//! Physicochemical Parameters
//!
//! Acid-base constants, Henry's law constants and gas-liquid transfer of the
//! network. Every constant is given at 25 °C with the standard enthalpy used for
//! the van't Hoff correction to the operating temperature.
//!
//! # Reference
//!
//! Water, carbonate, ammonium and the four volatile fatty acids follow the BSM2
//! implementation of ADM1. Phosphate and sulfide constants are standard
//! thermodynamic values at infinite dilution.

use rsadm_core::equilibrium::VantHoff;
use serde::{Deserialize, Serialize};

/// A dissociation constant as pK at 25 °C and its reaction enthalpy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dissociation {
    pub pk: f64,
    /// unit: J/mol
    pub enthalpy: f64,
}

impl Dissociation {
    pub const fn new(pk: f64, enthalpy: f64) -> Self {
        Self { pk, enthalpy }
    }

    pub fn van_t_hoff(&self) -> VantHoff {
        VantHoff::from_pk(self.pk, self.enthalpy)
    }
}

/// Henry's law solubility at 25 °C
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solubility {
    /// unit: kmol/(m^3 bar)
    pub k_h: f64,
    /// unit: J/mol
    pub enthalpy: f64,
}

impl Solubility {
    pub const fn new(k_h: f64, enthalpy: f64) -> Self {
        Self { k_h, enthalpy }
    }

    pub fn van_t_hoff(&self) -> VantHoff {
        VantHoff::new(self.k_h, self.enthalpy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicochemicalParameters {
    /// Ion product of water
    /// default: pK 14.0, 55900 J/mol
    pub water: Dissociation,
    /// CO2 / HCO3-
    /// default: pK 6.35, 7646 J/mol
    pub carbonate_1: Dissociation,
    /// HCO3- / CO3-2
    /// default: pK 10.33, 14850 J/mol
    pub carbonate_2: Dissociation,
    /// NH4+ / NH3
    /// default: pK 9.25, 51965 J/mol
    pub ammonium: Dissociation,
    /// default: pK 2.15, -8000 J/mol
    pub phosphate_1: Dissociation,
    /// default: pK 7.20, 3600 J/mol
    pub phosphate_2: Dissociation,
    /// default: pK 12.35, 16000 J/mol
    pub phosphate_3: Dissociation,
    /// H2S / HS-
    /// default: pK 6.99, 21670 J/mol
    pub sulfide: Dissociation,
    /// default: pK 4.86
    pub valerate: Dissociation,
    /// default: pK 4.82
    pub butyrate: Dissociation,
    /// default: pK 4.88
    pub propionate: Dissociation,
    /// default: pK 4.76
    pub acetate: Dissociation,

    /// default: 7.8e-4 kmol/(m^3 bar), -4180 J/mol
    pub henry_h2: Solubility,
    /// default: 0.0014 kmol/(m^3 bar), -14240 J/mol
    pub henry_ch4: Solubility,
    /// default: 0.035 kmol/(m^3 bar), -19410 J/mol
    pub henry_co2: Solubility,
    /// default: 0.105 kmol/(m^3 bar), -17460 J/mol
    pub henry_h2s: Solubility,

    /// Volumetric gas-liquid transfer coefficient, shared by all volatiles
    /// unit: 1/d
    /// default: 200.0
    pub k_la: f64,
}

impl Default for PhysicochemicalParameters {
    fn default() -> Self {
        Self {
            water: Dissociation::new(14.0, 55900.0),
            carbonate_1: Dissociation::new(6.35, 7646.0),
            carbonate_2: Dissociation::new(10.33, 14850.0),
            ammonium: Dissociation::new(9.25, 51965.0),
            phosphate_1: Dissociation::new(2.15, -8000.0),
            phosphate_2: Dissociation::new(7.20, 3600.0),
            phosphate_3: Dissociation::new(12.35, 16000.0),
            sulfide: Dissociation::new(6.99, 21670.0),
            valerate: Dissociation::new(4.86, 0.0),
            butyrate: Dissociation::new(4.82, 0.0),
            propionate: Dissociation::new(4.88, 0.0),
            acetate: Dissociation::new(4.76, 0.0),
            henry_h2: Solubility::new(7.8e-4, -4180.0),
            henry_ch4: Solubility::new(0.0014, -14240.0),
            henry_co2: Solubility::new(0.035, -19410.0),
            henry_h2s: Solubility::new(0.105, -17460.0),
            k_la: 200.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ammonium_constant_at_operating_temperature() {
        // BSM2 value of K_a,IN at 35 °C
        let params = PhysicochemicalParameters::default();
        let ka = params.ammonium.van_t_hoff().at(308.15);
        assert_relative_eq!(ka, 1.1102e-9, max_relative = 1e-3);
    }

    #[test]
    fn test_henry_constant_decreases_with_temperature() {
        let params = PhysicochemicalParameters::default();
        let henry = params.henry_co2.van_t_hoff();
        assert!(henry.at(308.15) < henry.at(298.15));
        assert_relative_eq!(henry.at(298.15), 0.035);
    }
}
