//! The 19 biochemical processes of ADM1: disintegration, three hydrolysis steps,
//! eight uptakes and seven biomass decays.

use super::{biological, close_nutrients};
use crate::parameters::Adm1Parameters;
use rsadm_core::component::ComponentRegistry;
use rsadm_core::equilibrium::FREE_AMMONIA;
use rsadm_core::errors::AdmResult;
use rsadm_core::inhibition::InhibitionTerm;
use rsadm_core::process::{FirstOrder, MonodUptake, Process};

/// Species name of free hydrogen sulfide
pub const FREE_H2S: &str = "H2S";

/// Biomass groups of the core network
pub const BIOMASS: [&str; 7] = ["X_su", "X_aa", "X_fa", "X_c4", "X_pro", "X_ac", "X_h2"];

pub fn processes(
    params: &Adm1Parameters,
    registry: &ComponentRegistry,
    sulfide_inhibition: bool,
) -> AdmResult<Vec<Process>> {
    let s = &params.stoichiometry;
    let k = &params.kinetics;
    let h2s = &params.sulfur;

    let nitrogen = InhibitionTerm::limitation("S_IN", k.k_s_in);
    let acidogenic = vec![
        InhibitionTerm::ph_hill(k.ph_aa.lower, k.ph_aa.upper),
        nitrogen.clone(),
    ];
    let with_h2 = |k_i: f64, k_i_h2s: f64| {
        let mut terms = acidogenic.clone();
        terms.push(InhibitionTerm::component("S_h2", k_i));
        if sulfide_inhibition {
            terms.push(InhibitionTerm::species(FREE_H2S, k_i_h2s));
        }
        terms
    };
    let mut acetoclastic = vec![
        InhibitionTerm::ph_hill(k.ph_ac.lower, k.ph_ac.upper),
        nitrogen.clone(),
        InhibitionTerm::species(FREE_AMMONIA, k.k_i_nh3),
    ];
    let mut hydrogenotrophic = vec![
        InhibitionTerm::ph_hill(k.ph_h2.lower, k.ph_h2.upper),
        nitrogen,
    ];
    if sulfide_inhibition {
        acetoclastic.push(InhibitionTerm::species(FREE_H2S, h2s.k_i_h2s_ac));
        hydrogenotrophic.push(InhibitionTerm::species(FREE_H2S, h2s.k_i_h2s_h2));
    }

    let mut rows = vec![
        biological("disintegration", FirstOrder::new("X_c", k.k_dis))
            .with("X_c", -1.0)
            .with("S_I", s.f_si_xc)
            .with("X_I", s.f_xi_xc)
            .with("X_ch", s.f_ch_xc)
            .with("X_pr", s.f_pr_xc)
            .with("X_li", s.f_li_xc),
        biological("hydrolysis_carbohydrates", FirstOrder::new("X_ch", k.k_hyd_ch))
            .with("X_ch", -1.0)
            .with("S_su", 1.0),
        biological("hydrolysis_proteins", FirstOrder::new("X_pr", k.k_hyd_pr))
            .with("X_pr", -1.0)
            .with("S_aa", 1.0),
        biological("hydrolysis_lipids", FirstOrder::new("X_li", k.k_hyd_li))
            .with("X_li", -1.0)
            .with("S_fa", s.f_fa_li)
            .with("S_su", 1.0 - s.f_fa_li),
        biological(
            "uptake_sugars",
            MonodUptake::new("S_su", "X_su", k.k_m_su, k.k_s_su).with_inhibitions(acidogenic.clone()),
        )
        .with("S_su", -1.0)
        .with("X_su", s.y_su)
        .with("S_h2", (1.0 - s.y_su) * s.f_h2_su)
        .with("S_bu", (1.0 - s.y_su) * s.f_bu_su)
        .with("S_pro", (1.0 - s.y_su) * s.f_pro_su)
        .with("S_ac", (1.0 - s.y_su) * s.f_ac_su),
        biological(
            "uptake_amino_acids",
            MonodUptake::new("S_aa", "X_aa", k.k_m_aa, k.k_s_aa).with_inhibitions(acidogenic.clone()),
        )
        .with("S_aa", -1.0)
        .with("X_aa", s.y_aa)
        .with("S_h2", (1.0 - s.y_aa) * s.f_h2_aa)
        .with("S_va", (1.0 - s.y_aa) * s.f_va_aa)
        .with("S_bu", (1.0 - s.y_aa) * s.f_bu_aa)
        .with("S_pro", (1.0 - s.y_aa) * s.f_pro_aa)
        .with("S_ac", (1.0 - s.y_aa) * s.f_ac_aa),
        biological(
            "uptake_lcfa",
            MonodUptake::new("S_fa", "X_fa", k.k_m_fa, k.k_s_fa).with_inhibitions({
                let mut terms = acidogenic.clone();
                terms.push(InhibitionTerm::component("S_h2", k.k_i_h2_fa));
                terms
            }),
        )
        .with("S_fa", -1.0)
        .with("X_fa", s.y_fa)
        .with("S_h2", (1.0 - s.y_fa) * 0.3)
        .with("S_ac", (1.0 - s.y_fa) * 0.7),
        biological(
            "uptake_valerate",
            MonodUptake::new("S_va", "X_c4", k.k_m_c4, k.k_s_c4)
                .with_inhibitions(with_h2(k.k_i_h2_c4, h2s.k_i_h2s_c4))
                .shared_with(&["S_bu"]),
        )
        .with("S_va", -1.0)
        .with("X_c4", s.y_c4)
        .with("S_pro", (1.0 - s.y_c4) * 0.54)
        .with("S_ac", (1.0 - s.y_c4) * 0.31)
        .with("S_h2", (1.0 - s.y_c4) * 0.15),
        biological(
            "uptake_butyrate",
            MonodUptake::new("S_bu", "X_c4", k.k_m_c4, k.k_s_c4)
                .with_inhibitions(with_h2(k.k_i_h2_c4, h2s.k_i_h2s_c4))
                .shared_with(&["S_va"]),
        )
        .with("S_bu", -1.0)
        .with("X_c4", s.y_c4)
        .with("S_ac", (1.0 - s.y_c4) * 0.8)
        .with("S_h2", (1.0 - s.y_c4) * 0.2),
        biological(
            "uptake_propionate",
            MonodUptake::new("S_pro", "X_pro", k.k_m_pro, k.k_s_pro)
                .with_inhibitions(with_h2(k.k_i_h2_pro, h2s.k_i_h2s_pro)),
        )
        .with("S_pro", -1.0)
        .with("X_pro", s.y_pro)
        .with("S_ac", (1.0 - s.y_pro) * 0.57)
        .with("S_h2", (1.0 - s.y_pro) * 0.43),
        biological(
            "uptake_acetate",
            MonodUptake::new("S_ac", "X_ac", k.k_m_ac, k.k_s_ac).with_inhibitions(acetoclastic),
        )
        .with("S_ac", -1.0)
        .with("X_ac", s.y_ac)
        .with("S_ch4", 1.0 - s.y_ac),
        biological(
            "uptake_hydrogen",
            MonodUptake::new("S_h2", "X_h2", k.k_m_h2, k.k_s_h2).with_inhibitions(hydrogenotrophic),
        )
        .with("S_h2", -1.0)
        .with("X_h2", s.y_h2)
        .with("S_ch4", 1.0 - s.y_h2),
    ];
    rows.extend(BIOMASS.iter().map(|x| decay(x, k.k_dec)));

    rows.into_iter()
        .map(|row| close_nutrients(row, registry))
        .collect()
}

/// First-order decay of a biomass group back to composites.
pub fn decay(biomass: &str, k_dec: f64) -> Process {
    biological(&format!("decay_{}", biomass), FirstOrder::new(biomass, k_dec))
        .with(biomass, -1.0)
        .with("X_c", 1.0)
}
