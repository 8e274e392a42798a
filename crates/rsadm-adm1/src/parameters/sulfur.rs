//! Sulfur Parameters
//!
//! Sulfate-reducing bacteria (SRB) competing with methanogens and acetogens for
//! hydrogen, acetate, propionate and butyrate/valerate, and sulfide inhibition of
//! both competitors.
//!
//! # Reference
//!
//! The four-group SRB structure follows the sulfur extension of the BSM2 ADM1
//! (Flores-Alsina et al., 2016). Rates are expressed as in the core network:
//! kg COD of substrate per kg COD of biomass per day.
//!
//! # Stoichiometry
//!
//! Propionate, butyrate and valerate are oxidised incompletely to acetate (and
//! propionate for valerate). The COD not recovered in biomass or organic products
//! reduces sulfate to sulfide:
//!
//! $$ \nu_{S_{IS}} = \frac{(1 - Y)(1 - f_{products})}{64} $$

use super::kinetics::PhLimits;
use serde::{Deserialize, Serialize};

/// Kinetics of one SRB group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrbGroup {
    /// unit: kg COD/(kg COD d)
    pub k_m: f64,
    /// unit: kg COD/m^3
    pub k_s: f64,
    /// Sulfate half-saturation
    /// unit: kmol S/m^3
    pub k_so4: f64,
    /// Free H2S inhibition
    /// unit: kmol S/m^3
    pub k_i_h2s: f64,
    /// unit: kg COD/kg COD
    pub y: f64,
    pub ph: PhLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SulfurParameters {
    /// Hydrogenotrophic SRB
    /// default: k_m 41.0, K_S 5.96e-6, Y 0.05
    pub hydrogen: SrbGroup,
    /// Acetotrophic SRB
    /// default: k_m 18.0, K_S 0.024, Y 0.041
    pub acetate: SrbGroup,
    /// Propionate-degrading SRB
    /// default: k_m 16.0, K_S 0.012, Y 0.035
    pub propionate: SrbGroup,
    /// Butyrate- and valerate-degrading SRB
    /// default: k_m 23.0, K_S 0.02, Y 0.0329
    pub butyrate: SrbGroup,

    /// Acetate recovered from propionate oxidation
    /// unit: kg COD/kg COD
    /// default: 0.57
    pub f_ac_pro: f64,
    /// default: 0.8
    pub f_ac_bu: f64,
    /// default: 0.31
    pub f_ac_va: f64,
    /// default: 0.54
    pub f_pro_va: f64,

    /// Free H2S inhibition of the methanogenic and acetogenic groups
    /// unit: kmol S/m^3
    /// default: 0.0143
    pub k_i_h2s_ac: f64,
    /// default: 0.0156
    pub k_i_h2s_h2: f64,
    /// default: 0.0094
    pub k_i_h2s_pro: f64,
    /// default: 0.0150
    pub k_i_h2s_c4: f64,

    /// unit: 1/d
    /// default: 0.02
    pub k_dec: f64,
}

impl Default for SulfurParameters {
    fn default() -> Self {
        Self {
            hydrogen: SrbGroup {
                k_m: 41.0,
                k_s: 5.96e-6,
                k_so4: 1.04e-4,
                k_i_h2s: 0.0081,
                y: 0.05,
                ph: PhLimits::new(5.0, 6.0),
            },
            acetate: SrbGroup {
                k_m: 18.0,
                k_s: 0.024,
                k_so4: 2.0e-4,
                k_i_h2s: 0.0069,
                y: 0.041,
                ph: PhLimits::new(6.0, 7.0),
            },
            propionate: SrbGroup {
                k_m: 16.0,
                k_s: 0.012,
                k_so4: 2.0e-4,
                k_i_h2s: 0.0081,
                y: 0.035,
                ph: PhLimits::new(6.0, 7.0),
            },
            butyrate: SrbGroup {
                k_m: 23.0,
                k_s: 0.02,
                k_so4: 2.0e-4,
                k_i_h2s: 0.0084,
                y: 0.0329,
                ph: PhLimits::new(6.0, 7.0),
            },
            f_ac_pro: 0.57,
            f_ac_bu: 0.8,
            f_ac_va: 0.31,
            f_pro_va: 0.54,
            k_i_h2s_ac: 0.0143,
            k_i_h2s_h2: 0.0156,
            k_i_h2s_pro: 0.0094,
            k_i_h2s_c4: 0.0150,
            k_dec: 0.02,
        }
    }
}
