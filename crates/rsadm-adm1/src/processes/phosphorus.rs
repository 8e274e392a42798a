//! PAO processes: PHA storage from each volatile fatty acid with polyphosphate
//! release, and lysis of PAO, PP and PHA.

use super::{biological, biochemical::decay, close_nutrients};
use crate::parameters::PhosphorusParameters;
use rsadm_core::component::ComponentRegistry;
use rsadm_core::errors::AdmResult;
use rsadm_core::process::{FirstOrder, MonodUptake, Process};

/// Volatile fatty acids stored as PHA, in the order of [`PhosphorusParameters::f_pha_lysis`]
pub const STORED_ACIDS: [&str; 4] = ["S_va", "S_bu", "S_pro", "S_ac"];

pub fn processes(params: &PhosphorusParameters, registry: &ComponentRegistry) -> AdmResult<Vec<Process>> {
    let mut rows = Vec::with_capacity(STORED_ACIDS.len() + 3);
    for acid in STORED_ACIDS {
        let others: Vec<&str> = STORED_ACIDS.iter().copied().filter(|a| *a != acid).collect();
        let law = MonodUptake::new(acid, "X_PAO", params.q_pha, params.k_a)
            .shared_with(&others)
            .with_ratio_limitation("X_PP", "X_PAO", params.k_pp);
        rows.push(
            biological(&format!("storage_pha_{}", acid), law)
                .with(acid, -1.0)
                .with("X_PHA", 1.0)
                .with("X_PP", -params.y_po4)
                .with("S_IP", params.y_po4)
                .with("S_K", params.k_per_pp * params.y_po4)
                .with("S_Mg", params.mg_per_pp * params.y_po4),
        );
    }

    let mut pao = decay("X_PAO", params.b_pao);
    pao.name = "lysis_X_PAO".to_string();
    rows.push(pao);
    rows.push(
        biological("lysis_X_PP", FirstOrder::new("X_PP", params.b_pp))
            .with("X_PP", -1.0)
            .with("S_IP", 1.0)
            .with("S_K", params.k_per_pp)
            .with("S_Mg", params.mg_per_pp),
    );
    let pha = STORED_ACIDS.iter().zip(params.f_pha_lysis).fold(
        biological("lysis_X_PHA", FirstOrder::new("X_PHA", params.b_pha)).with("X_PHA", -1.0),
        |row, (acid, fraction)| row.with(acid, fraction),
    );
    rows.push(pha);

    rows.into_iter()
        .map(|row| close_nutrients(row, registry))
        .collect()
}
