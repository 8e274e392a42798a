//! Mineral precipitation and gas-liquid transfer.

use crate::parameters::{MineralDefinition, PhysicochemicalParameters, Solubility};
use rsadm_core::activity::{Mineral, MineralIon};
use rsadm_core::equilibrium::{VantHoff, DISSOLVED_CO2};
use rsadm_core::gas::GasSpecies;
use rsadm_core::inhibition::Target;
use rsadm_core::process::{GasTransfer, Precipitation, Process, ProcessClass};

use super::biochemical::FREE_H2S;

/// Saturation description of a mineral for the kernel.
pub fn mineral(definition: &MineralDefinition) -> Mineral {
    Mineral {
        component: definition.id.clone(),
        ions: definition
            .ions
            .iter()
            .map(|ion| MineralIon::new(&ion.species, ion.power))
            .collect(),
        solubility: VantHoff::from_pk(definition.pk_sp, definition.enthalpy),
        rate_constant: definition.rate_constant,
        kinetic_order: definition.kinetic_order,
    }
}

/// Precipitation row: one kg of mineral formed per unit rate, ions drawn from their totals.
pub fn precipitation(definition: &MineralDefinition) -> Process {
    let law = Precipitation {
        mineral: definition.id.clone(),
        rate_constant: definition.rate_constant,
        kinetic_order: definition.kinetic_order,
    };
    definition
        .ions
        .iter()
        .filter_map(|ion| ion.component.as_deref().map(|id| (id, ion.power)))
        .fold(
            Process::new(
                &format!("precipitation_{}", definition.id),
                ProcessClass::Precipitation,
                law,
            )
            .with(&definition.id, 1.0),
            |row, (id, power)| row.with(id, -power / definition.molar_mass),
        )
}

/// A volatile species together with its transfer process.
#[derive(Debug)]
pub struct Volatile {
    pub process: Process,
    pub species: GasSpecies,
}

fn volatile(
    gas: &str,
    dissolved: Target,
    total: &str,
    solubility: &Solubility,
    k_la: f64,
    liquid_per_kmol: f64,
) -> Volatile {
    let name = format!("transfer_{}", gas.trim_start_matches("G_"));
    let law = GasTransfer {
        dissolved,
        gas: gas.to_string(),
        k_la,
        henry: solubility.van_t_hoff(),
        liquid_per_kmol,
    };
    Volatile {
        process: Process::new(&name, ProcessClass::GasTransfer, law).with(total, -1.0),
        species: GasSpecies::new(gas, &name, 1.0 / liquid_per_kmol),
    }
}

/// Hydrogen, methane and carbon dioxide, plus hydrogen sulfide when stripped.
pub fn volatiles(params: &PhysicochemicalParameters, h2s_stripping: bool) -> Vec<Volatile> {
    let k_la = params.k_la;
    let mut volatiles = vec![
        volatile(
            "G_h2",
            Target::Component("S_h2".to_string()),
            "S_h2",
            &params.henry_h2,
            k_la,
            16.0,
        ),
        volatile(
            "G_ch4",
            Target::Component("S_ch4".to_string()),
            "S_ch4",
            &params.henry_ch4,
            k_la,
            64.0,
        ),
        volatile(
            "G_co2",
            Target::Species(DISSOLVED_CO2.to_string()),
            "S_IC",
            &params.henry_co2,
            k_la,
            1.0,
        ),
    ];
    if h2s_stripping {
        volatiles.push(volatile(
            "G_h2s",
            Target::Species(FREE_H2S.to_string()),
            "S_IS",
            &params.henry_h2s,
            k_la,
            1.0,
        ));
    }
    volatiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::MineralParameters;
    use approx::assert_relative_eq;

    #[test]
    fn test_struvite_row_draws_one_kmol_of_each_ion() {
        let params = MineralParameters::default();
        let struvite = params.minerals.iter().find(|m| m.id == "X_struv").unwrap();
        let row = precipitation(struvite);
        assert_eq!(row.name, "precipitation_X_struv");
        assert_eq!(row.stoichiometry["X_struv"], 1.0);
        for id in ["S_Mg", "S_IN", "S_IP"] {
            assert_relative_eq!(row.stoichiometry[id] * 245.41, -1.0);
        }
    }

    #[test]
    fn test_iron_sulfide_leaves_protons_to_the_charge_balance() {
        let params = MineralParameters::default();
        let fes = params.minerals.iter().find(|m| m.id == "X_FeS").unwrap();
        let row = precipitation(fes);
        assert_eq!(row.stoichiometry.len(), 3);
        assert_relative_eq!(mineral(fes).stoichiometric_sum(), 1.0);
    }

    #[test]
    fn test_volatile_count_follows_stripping_option() {
        let params = PhysicochemicalParameters::default();
        assert_eq!(volatiles(&params, false).len(), 3);
        let with_h2s = volatiles(&params, true);
        assert_eq!(with_h2s.len(), 4);
        assert_eq!(with_h2s[3].species.transfer_process, "transfer_h2s");
        assert_relative_eq!(with_h2s[0].species.kmol_per_unit, 1.0 / 16.0);
    }
}
