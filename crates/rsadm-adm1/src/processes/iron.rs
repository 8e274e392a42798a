//! Abiotic reduction of ferric iron.
//!
//! Rates are expressed per kmol of iron reduced. Ferrous iron carries one electron
//! equivalent of COD, so both reactions close the COD balance exactly:
//!
//! - `Fe3+ + ½ H2 → Fe2+ + H+`
//! - `Fe3+ + ½ HS- → Fe2+ + ½ S0 + ½ H+`

use crate::components::{COD_PER_KMOL_FERROUS, COD_PER_KMOL_SULFIDE, COD_PER_KMOL_SULFUR};
use crate::parameters::IronParameters;
use rsadm_core::inhibition::Target;
use rsadm_core::process::{MassAction, Process, ProcessClass};

pub fn processes(params: &IronParameters) -> Vec<Process> {
    let by_hydrogen = MassAction {
        reactants: vec![
            (Target::Component("S_Fe3".to_string()), 1.0),
            (Target::Component("S_h2".to_string()), 1.0),
        ],
        k: params.k_fe3_h2,
    };
    let by_sulfide = MassAction {
        reactants: vec![
            (Target::Component("S_Fe3".to_string()), 1.0),
            (Target::Component("S_IS".to_string()), 1.0),
        ],
        k: params.k_fe3_hs,
    };
    // Sulfide electrons per kmol of iron reduced
    let sulfide = COD_PER_KMOL_FERROUS / (COD_PER_KMOL_SULFIDE - COD_PER_KMOL_SULFUR);
    vec![
        Process::new("iron_reduction_hydrogen", ProcessClass::Chemical, by_hydrogen)
            .with("S_Fe3", -1.0)
            .with("S_Fe2", 1.0)
            .with("S_h2", -COD_PER_KMOL_FERROUS),
        Process::new("iron_reduction_sulfide", ProcessClass::Chemical, by_sulfide)
            .with("S_Fe3", -1.0)
            .with("S_Fe2", 1.0)
            .with("S_IS", -sulfide)
            .with("X_S0", sulfide),
    ]
}
