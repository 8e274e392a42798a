//! Sulfate reduction by four SRB groups and their decay.

use super::{biochemical::decay, biochemical::FREE_H2S, biological, close_nutrients};
use crate::components::COD_PER_KMOL_SULFIDE;
use crate::parameters::{KineticParameters, SrbGroup, SulfurParameters};
use rsadm_core::component::ComponentRegistry;
use rsadm_core::errors::AdmResult;
use rsadm_core::inhibition::InhibitionTerm;
use rsadm_core::process::{MonodUptake, Process};

pub const SRB: [&str; 4] = ["X_hSRB", "X_aSRB", "X_pSRB", "X_c4SRB"];

fn uptake(
    name: &str,
    substrate: &str,
    biomass: &str,
    group: &SrbGroup,
    k_s_in: f64,
    products: &[(&str, f64)],
    competing: &[&str],
) -> Process {
    let law = MonodUptake::new(substrate, biomass, group.k_m, group.k_s)
        .with_inhibitions(vec![
            InhibitionTerm::ph_hill(group.ph.lower, group.ph.upper),
            InhibitionTerm::limitation("S_SO4", group.k_so4),
            InhibitionTerm::limitation("S_IN", k_s_in),
            InhibitionTerm::species(FREE_H2S, group.k_i_h2s),
        ])
        .shared_with(competing);
    let oxidised = 1.0 - products.iter().map(|(_, f)| f).sum::<f64>();
    // COD not kept in organics reduces sulfate
    let sulfide = (1.0 - group.y) * oxidised / COD_PER_KMOL_SULFIDE;
    products.iter().fold(
        biological(name, law)
            .with(substrate, -1.0)
            .with(biomass, group.y)
            .with("S_IS", sulfide)
            .with("S_SO4", -sulfide),
        |row, (product, fraction)| row.with(product, (1.0 - group.y) * fraction),
    )
}

pub fn processes(
    params: &SulfurParameters,
    kinetics: &KineticParameters,
    registry: &ComponentRegistry,
) -> AdmResult<Vec<Process>> {
    let k_s_in = kinetics.k_s_in;
    let mut rows = vec![
        uptake("uptake_hydrogen_srb", "S_h2", "X_hSRB", &params.hydrogen, k_s_in, &[], &[]),
        uptake("uptake_acetate_srb", "S_ac", "X_aSRB", &params.acetate, k_s_in, &[], &[]),
        uptake(
            "uptake_propionate_srb",
            "S_pro",
            "X_pSRB",
            &params.propionate,
            k_s_in,
            &[("S_ac", params.f_ac_pro)],
            &[],
        ),
        uptake(
            "uptake_butyrate_srb",
            "S_bu",
            "X_c4SRB",
            &params.butyrate,
            k_s_in,
            &[("S_ac", params.f_ac_bu)],
            &["S_va"],
        ),
        uptake(
            "uptake_valerate_srb",
            "S_va",
            "X_c4SRB",
            &params.butyrate,
            k_s_in,
            &[("S_pro", params.f_pro_va), ("S_ac", params.f_ac_va)],
            &["S_bu"],
        ),
    ];
    rows.extend(SRB.iter().map(|x| decay(x, params.k_dec)));

    rows.into_iter()
        .map(|row| close_nutrients(row, registry))
        .collect()
}
