//! Kinetic Parameters
//!
//! Rate constants, half-saturation constants and inhibition limits of the ADM1
//! core network.
//!
//! # Reference
//!
//! Benchmark Simulation Model No. 2 values at 35 °C (Rosen and Jeppsson, 2006).
//! The pH inhibition uses the Hill form of the benchmark with limits given as
//! pH values.

use serde::{Deserialize, Serialize};

/// Lower and upper pH limits of a Hill inhibition term
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhLimits {
    pub lower: f64,
    pub upper: f64,
}

impl PhLimits {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticParameters {
    /// unit: 1/d
    /// default: 0.5
    pub k_dis: f64,
    /// unit: 1/d
    /// default: 10.0
    pub k_hyd_ch: f64,
    /// unit: 1/d
    /// default: 10.0
    pub k_hyd_pr: f64,
    /// unit: 1/d
    /// default: 10.0
    pub k_hyd_li: f64,

    /// Maximum specific uptake rates
    /// unit: kg COD/(kg COD d)
    /// default: 30.0
    pub k_m_su: f64,
    /// default: 50.0
    pub k_m_aa: f64,
    /// default: 6.0
    pub k_m_fa: f64,
    /// default: 20.0
    pub k_m_c4: f64,
    /// default: 13.0
    pub k_m_pro: f64,
    /// default: 8.0
    pub k_m_ac: f64,
    /// default: 35.0
    pub k_m_h2: f64,

    /// Half-saturation constants
    /// unit: kg COD/m^3
    /// default: 0.5
    pub k_s_su: f64,
    /// default: 0.3
    pub k_s_aa: f64,
    /// default: 0.4
    pub k_s_fa: f64,
    /// default: 0.2
    pub k_s_c4: f64,
    /// default: 0.1
    pub k_s_pro: f64,
    /// default: 0.15
    pub k_s_ac: f64,
    /// default: 7e-6
    pub k_s_h2: f64,

    /// Inorganic nitrogen limitation
    /// unit: kmol N/m^3
    /// default: 1e-4
    pub k_s_in: f64,

    /// Hydrogen inhibition of fatty acid uptake
    /// unit: kg COD/m^3
    /// default: 5e-6
    pub k_i_h2_fa: f64,
    /// default: 1e-5
    pub k_i_h2_c4: f64,
    /// default: 3.5e-6
    pub k_i_h2_pro: f64,
    /// Free ammonia inhibition of acetoclastic methanogens
    /// unit: kmol N/m^3
    /// default: 0.0018
    pub k_i_nh3: f64,

    /// pH limits of the acidogenic and acetogenic groups
    /// default: 4.0 to 5.5
    pub ph_aa: PhLimits,
    /// default: 6.0 to 7.0
    pub ph_ac: PhLimits,
    /// default: 5.0 to 6.0
    pub ph_h2: PhLimits,

    /// First-order biomass decay, shared by all groups
    /// unit: 1/d
    /// default: 0.02
    pub k_dec: f64,
}

impl Default for KineticParameters {
    fn default() -> Self {
        Self {
            k_dis: 0.5,
            k_hyd_ch: 10.0,
            k_hyd_pr: 10.0,
            k_hyd_li: 10.0,
            k_m_su: 30.0,
            k_m_aa: 50.0,
            k_m_fa: 6.0,
            k_m_c4: 20.0,
            k_m_pro: 13.0,
            k_m_ac: 8.0,
            k_m_h2: 35.0,
            k_s_su: 0.5,
            k_s_aa: 0.3,
            k_s_fa: 0.4,
            k_s_c4: 0.2,
            k_s_pro: 0.1,
            k_s_ac: 0.15,
            k_s_h2: 7e-6,
            k_s_in: 1e-4,
            k_i_h2_fa: 5e-6,
            k_i_h2_c4: 1e-5,
            k_i_h2_pro: 3.5e-6,
            k_i_nh3: 0.0018,
            ph_aa: PhLimits::new(4.0, 5.5),
            ph_ac: PhLimits::new(6.0, 7.0),
            ph_h2: PhLimits::new(5.0, 6.0),
            k_dec: 0.02,
        }
    }
}
