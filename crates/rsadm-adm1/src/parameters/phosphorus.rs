//! Phosphorus Parameters
//!
//! Phosphorus-accumulating organisms (PAO) arriving with waste activated sludge.
//! Under anaerobic conditions they take up volatile fatty acids, store them as
//! polyhydroxyalkanoates (PHA) and release orthophosphate from polyphosphate
//! (PP), together with the potassium and magnesium counter-ions. PAO, PP and PHA
//! lyse without regrowth.
//!
//! # Reference
//!
//! Process structure of the phosphorus extension of the BSM2 ADM1
//! (Flores-Alsina et al., 2016), with ASM2d kinetics for storage and lysis.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhosphorusParameters {
    /// PHA storage rate
    /// unit: kg COD/(kg COD d)
    /// default: 3.0
    pub q_pha: f64,
    /// VFA half-saturation for storage
    /// unit: kg COD/m^3
    /// default: 0.004
    pub k_a: f64,
    /// Half-saturation of the PP/PAO ratio
    /// unit: kmol P/kg COD
    /// default: 3.2e-4
    pub k_pp: f64,
    /// Phosphate released per PHA stored
    /// unit: kmol P/kg COD
    /// default: 0.0129
    pub y_po4: f64,

    /// unit: 1/d
    /// default: 0.2
    pub b_pao: f64,
    /// unit: 1/d
    /// default: 0.2
    pub b_pp: f64,
    /// unit: 1/d
    /// default: 0.2
    pub b_pha: f64,

    /// Potassium bound per phosphorus in PP
    /// unit: kmol K/kmol P
    /// default: 0.33
    pub k_per_pp: f64,
    /// unit: kmol Mg/kmol P
    /// default: 0.33
    pub mg_per_pp: f64,

    /// Fractions of lysed PHA returned as each acid (valerate, butyrate, propionate, acetate)
    /// default: 0.1, 0.1, 0.4, 0.4
    pub f_pha_lysis: [f64; 4],

    /// unit: kmol C/kg COD
    /// default: 0.03
    pub c_pha: f64,
}

impl Default for PhosphorusParameters {
    fn default() -> Self {
        Self {
            q_pha: 3.0,
            k_a: 0.004,
            k_pp: 3.2e-4,
            y_po4: 0.0129,
            b_pao: 0.2,
            b_pp: 0.2,
            b_pha: 0.2,
            k_per_pp: 0.33,
            mg_per_pp: 0.33,
            f_pha_lysis: [0.1, 0.1, 0.4, 0.4],
            c_pha: 0.03,
        }
    }
}
