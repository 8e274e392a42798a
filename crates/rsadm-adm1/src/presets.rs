//! Reference operating points.
//!
//! The BSM2 anaerobic digester: 3400 m³ liquid, 300 m³ headspace, 170 m³/d at
//! 35 °C, fed with the constant benchmark influent. The initial state is the
//! benchmark steady state. Both records add inorganic phosphorus so the
//! phosphorus-carrying biomass has a nutrient pool to draw from; every other
//! extended component starts at zero.

use rsadm_core::records::{BasisOfDesign, DigesterRecord, Sizing};
use rsadm_core::state::ConcentrationRecord;

pub const BSM2_FLOW: f64 = 170.0;
pub const BSM2_TEMPERATURE: f64 = 308.15;
pub const BSM2_LIQUID_VOLUME: f64 = 3400.0;
pub const BSM2_GAS_VOLUME: f64 = 300.0;

fn record(entries: &[(&str, f64)]) -> ConcentrationRecord {
    entries
        .iter()
        .map(|(id, value)| (id.to_string(), (*value).into()))
        .collect()
}

pub fn bsm2_influent() -> ConcentrationRecord {
    record(&[
        ("S_su", 0.01),
        ("S_aa", 0.001),
        ("S_fa", 0.001),
        ("S_va", 0.001),
        ("S_bu", 0.001),
        ("S_pro", 0.001),
        ("S_ac", 0.001),
        ("S_h2", 1e-8),
        ("S_ch4", 1e-5),
        ("S_IC", 0.04),
        ("S_IN", 0.01),
        ("S_I", 0.02),
        ("X_c", 2.0),
        ("X_ch", 5.0),
        ("X_pr", 20.0),
        ("X_li", 5.0),
        ("X_su", 0.0),
        ("X_aa", 0.01),
        ("X_fa", 0.01),
        ("X_c4", 0.01),
        ("X_pro", 0.01),
        ("X_ac", 0.01),
        ("X_h2", 0.01),
        ("X_I", 25.0),
        ("S_Na", 0.04),
        ("S_Cl", 0.02),
        ("S_IP", 0.005),
    ])
}

/// Liquid and headspace steady state of the benchmark.
pub fn bsm2_initial() -> ConcentrationRecord {
    record(&[
        ("S_su", 0.011954829),
        ("S_aa", 0.005314748),
        ("S_fa", 0.098621401),
        ("S_va", 0.011625006),
        ("S_bu", 0.013250730),
        ("S_pro", 0.015783666),
        ("S_ac", 0.197629308),
        ("S_h2", 2.3594e-7),
        ("S_ch4", 0.055088123),
        ("S_IC", 0.152677842),
        ("S_IN", 0.130222866),
        ("S_I", 0.328697664),
        ("X_c", 0.308697664),
        ("X_ch", 0.027947290),
        ("X_pr", 0.102574106),
        ("X_li", 0.029483049),
        ("X_su", 0.420217980),
        ("X_aa", 1.179177110),
        ("X_fa", 0.243034017),
        ("X_c4", 0.431921070),
        ("X_pro", 0.137306000),
        ("X_ac", 0.760564430),
        ("X_h2", 0.317021550),
        ("X_I", 25.617440100),
        ("S_Na", 0.04),
        ("S_Cl", 0.02),
        ("S_IP", 0.0043),
        ("G_h2", 1.0241e-5),
        ("G_ch4", 1.625566),
        ("G_co2", 0.014040),
    ])
}

/// The complete benchmark run record.
pub fn bsm2_digester() -> DigesterRecord {
    DigesterRecord {
        basis: BasisOfDesign {
            flow: BSM2_FLOW,
            temperature: BSM2_TEMPERATURE,
            retention_time: BSM2_LIQUID_VOLUME / BSM2_FLOW,
        },
        sizing: Sizing {
            liquid_volume: Some(BSM2_LIQUID_VOLUME),
            gas_volume: Some(BSM2_GAS_VOLUME),
            ..Sizing::default()
        },
        influent: bsm2_influent(),
        initial: bsm2_initial(),
    }
}
