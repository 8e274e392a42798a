//! Assembly of the extended ADM1 network into a [`ReactionModel`].

use crate::components;
use crate::parameters::{Adm1Parameters, PhysicochemicalParameters};
use crate::processes::{biochemical, iron, phosphorus, physicochemical, sulfur};
use rsadm_core::component::ComponentRegistry;
use rsadm_core::equilibrium::{EquilibriumSettings, EquilibriumSystem, StrongIon, WeakAcidSystem};
use rsadm_core::errors::AdmResult;
use rsadm_core::reactor::{ModelParts, QuasiSteadySettings, ReactionModel};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Dissolved hydrogen, solved algebraically in every evaluation
pub const ALGEBRAIC_HYDROGEN: &str = "S_h2";

/// Which process groups are part of the network, and the solver settings used by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// PAO, polyphosphate and PHA
    pub phosphorus: bool,
    /// Sulfate-reducing bacteria and sulfide inhibition
    pub sulfur: bool,
    /// Fe(III) reduction and elemental sulfur
    pub iron: bool,
    /// The thirteen precipitating minerals
    pub minerals: bool,
    /// Hydrogen sulfide as a fourth volatile species
    pub h2s_stripping: bool,
    pub equilibrium: EquilibriumSettings,
    pub quasi_steady: QuasiSteadySettings,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            phosphorus: true,
            sulfur: true,
            iron: true,
            minerals: true,
            h2s_stripping: true,
            equilibrium: EquilibriumSettings::default(),
            quasi_steady: QuasiSteadySettings::default(),
        }
    }
}

impl ModelOptions {
    /// The BSM2 network: 19 biochemical processes and three volatiles.
    pub fn core() -> Self {
        Self {
            phosphorus: false,
            sulfur: false,
            iron: false,
            minerals: false,
            h2s_stripping: false,
            ..Self::default()
        }
    }
}

/// Charge balance over water, carbonate, ammonium, phosphate, sulfide and the four
/// volatile fatty acids, with the remaining ions fully dissociated.
pub fn acid_base(
    params: &PhysicochemicalParameters,
    registry: &ComponentRegistry,
    settings: EquilibriumSettings,
) -> AdmResult<EquilibriumSystem> {
    let names = |ids: &[&str]| ids.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let weak = vec![
        WeakAcidSystem {
            component: "S_IC".to_string(),
            species: names(&["CO2", "HCO3-", "CO3-2"]),
            top_charge: 0,
            constants: vec![
                params.carbonate_1.van_t_hoff(),
                params.carbonate_2.van_t_hoff(),
            ],
        },
        WeakAcidSystem::monoprotic("S_IN", "NH4+", "NH3", 1, params.ammonium.van_t_hoff()),
        WeakAcidSystem {
            component: "S_IP".to_string(),
            species: names(&["H3PO4", "H2PO4-", "HPO4-2", "PO4-3"]),
            top_charge: 0,
            constants: vec![
                params.phosphate_1.van_t_hoff(),
                params.phosphate_2.van_t_hoff(),
                params.phosphate_3.van_t_hoff(),
            ],
        },
        WeakAcidSystem::monoprotic("S_IS", biochemical::FREE_H2S, "HS-", 0, params.sulfide.van_t_hoff()),
        WeakAcidSystem::monoprotic("S_va", "HVa", "Va-", 0, params.valerate.van_t_hoff()),
        WeakAcidSystem::monoprotic("S_bu", "HBu", "Bu-", 0, params.butyrate.van_t_hoff()),
        WeakAcidSystem::monoprotic("S_pro", "HPro", "Pro-", 0, params.propionate.van_t_hoff()),
        WeakAcidSystem::monoprotic("S_ac", "HAc", "Ac-", 0, params.acetate.van_t_hoff()),
    ];
    let strong = vec![
        StrongIon::new("S_Na", "Na+", 1),
        StrongIon::new("S_K", "K+", 1),
        StrongIon::new("S_Cl", "Cl-", -1),
        StrongIon::new("S_Ca", "Ca+2", 2),
        StrongIon::new("S_Mg", "Mg+2", 2),
        StrongIon::new("S_SO4", "SO4-2", -2),
        StrongIon::new("S_Fe2", "Fe+2", 2),
        StrongIon::new("S_Fe3", "Fe+3", 3),
        StrongIon::new("S_Al", "Al+3", 3),
    ];
    EquilibriumSystem::new(registry, params.water.van_t_hoff(), weak, strong, settings)
}

/// Build the network for the enabled process groups.
pub fn build_model(params: &Adm1Parameters, options: &ModelOptions) -> AdmResult<ReactionModel> {
    let registry = components::registry(params, options)?;

    let mut processes = biochemical::processes(params, &registry, options.sulfur)?;
    if options.phosphorus {
        processes.extend(phosphorus::processes(&params.phosphorus, &registry)?);
    }
    if options.sulfur {
        processes.extend(sulfur::processes(&params.sulfur, &params.kinetics, &registry)?);
    }
    if options.iron {
        processes.extend(iron::processes(&params.iron));
    }
    let mut minerals = Vec::new();
    if options.minerals {
        for definition in &params.minerals.minerals {
            processes.push(physicochemical::precipitation(definition));
            minerals.push(physicochemical::mineral(definition));
        }
    }
    let mut gas_species = Vec::new();
    for volatile in physicochemical::volatiles(&params.physicochemical, options.h2s_stripping) {
        processes.push(volatile.process);
        gas_species.push(volatile.species);
    }

    let equilibrium = acid_base(&params.physicochemical, &registry, options.equilibrium)?;
    info!(
        components = registry.len(),
        processes = processes.len(),
        minerals = minerals.len(),
        volatiles = gas_species.len(),
        "Assembled ADM1 network"
    );
    ReactionModel::new(ModelParts {
        registry,
        processes,
        equilibrium,
        minerals,
        gas_species,
        algebraic: vec![ALGEBRAIC_HYDROGEN.to_string()],
        quasi_steady: options.quasi_steady,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_network_size() {
        let model = build_model(&Adm1Parameters::default(), &ModelOptions::core()).unwrap();
        // 19 biochemical processes and 3 transfers
        assert_eq!(model.rate_table.len(), 22);
        assert_eq!(model.gas.len(), 3);
        assert!(model.minerals.is_empty());
    }

    #[test]
    fn test_extended_network_size() {
        let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
        // + 7 PAO, 9 SRB, 2 iron, 13 minerals, 1 more transfer
        assert_eq!(model.rate_table.len(), 22 + 7 + 9 + 2 + 13 + 1);
        assert_eq!(model.gas.len(), 4);
        assert_eq!(model.minerals.len(), 13);
        assert_eq!(model.algebraic, vec![ALGEBRAIC_HYDROGEN.to_string()]);
    }

    #[test]
    fn test_model_round_trips_through_json() {
        let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
        let restored = ReactionModel::from_json(&model.to_json().unwrap()).unwrap();
        assert_eq!(restored.rate_table.len(), model.rate_table.len());
        for (a, b) in restored.rate_table.matrix().iter().zip(model.rate_table.matrix()) {
            assert!((a - b).abs() <= 1e-12 * b.abs().max(1.0));
        }
        assert_eq!(restored.registry.all_ids(), model.registry.all_ids());
    }

    #[test]
    fn test_options_read_from_toml() {
        let options: ModelOptions = rsadm_core::records::from_toml_str(
            r#"
            sulfur = false
            h2s_stripping = false
            "#,
        )
        .unwrap();
        assert!(!options.sulfur && !options.h2s_stripping);
        assert!(options.phosphorus && options.minerals);
    }
}
