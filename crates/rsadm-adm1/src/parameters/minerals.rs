//! Mineral Parameters
//!
//! The thirteen minerals that may precipitate in the digester: calcium carbonates
//! and phosphates, the magnesium phosphates and carbonate, iron sulfide and the
//! iron and aluminium phosphates.
//!
//! # Reference
//!
//! Solubility products are thermodynamic values at 25 °C in activity terms
//! (MINTEQ/PHREEQC databases). Rate constants follow the kinetic precipitation
//! framework of Kazadi Mbamba et al. (2015) as used in the BSM2 physicochemical
//! extension.
//!
//! A reaction enthalpy of zero disables the temperature correction where no
//! reliable value is tabulated.

use serde::{Deserialize, Serialize};

/// One ion of a mineral's dissolution reaction and the component it is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonShare {
    /// Species name as produced by the acid-base solve
    pub species: String,
    /// Liquid component whose total loses the ion on precipitation; `None` for H+ and OH-
    pub component: Option<String>,
    /// Coefficient in the ion activity product, negative for ions released on dissolution
    pub power: f64,
}

impl IonShare {
    fn of(species: &str, component: &str, power: f64) -> Self {
        Self {
            species: species.to_string(),
            component: Some(component.to_string()),
            power,
        }
    }

    fn water(species: &str, power: f64) -> Self {
        Self {
            species: species.to_string(),
            component: None,
            power,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineralDefinition {
    /// Component id of the precipitated mass
    pub id: String,
    pub name: String,
    /// unit: kg/kmol
    pub molar_mass: f64,
    /// $-\log_{10} K_{sp}$ at 25 °C
    pub pk_sp: f64,
    /// Dissolution enthalpy
    /// unit: J/mol
    pub enthalpy: f64,
    /// unit: 1/d
    pub rate_constant: f64,
    pub kinetic_order: f64,
    pub ions: Vec<IonShare>,
}

impl MineralDefinition {
    fn new(id: &str, name: &str, molar_mass: f64, pk_sp: f64, enthalpy: f64, rate_constant: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            molar_mass,
            pk_sp,
            enthalpy,
            rate_constant,
            kinetic_order: 2.0,
            ions: Vec::new(),
        }
    }

    fn ion(mut self, species: &str, component: &str, power: f64) -> Self {
        self.ions.push(IonShare::of(species, component, power));
        self
    }

    fn water_ion(mut self, species: &str, power: f64) -> Self {
        self.ions.push(IonShare::water(species, power));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MineralParameters {
    pub minerals: Vec<MineralDefinition>,
}

impl Default for MineralParameters {
    fn default() -> Self {
        let minerals = vec![
            MineralDefinition::new("X_CCM", "calcite", 100.09, 8.48, -9610.0, 0.24)
                .ion("Ca+2", "S_Ca", 1.0)
                .ion("CO3-2", "S_IC", 1.0),
            MineralDefinition::new("X_ACC", "amorphous calcium carbonate", 100.09, 6.40, -10830.0, 72.0)
                .ion("Ca+2", "S_Ca", 1.0)
                .ion("CO3-2", "S_IC", 1.0),
            MineralDefinition::new("X_ACP", "amorphous calcium phosphate", 310.18, 25.46, 0.0, 0.0072)
                .ion("Ca+2", "S_Ca", 3.0)
                .ion("PO4-3", "S_IP", 2.0),
            MineralDefinition::new("X_HAP", "hydroxyapatite", 502.31, 44.333, 0.0, 0.0072)
                .ion("Ca+2", "S_Ca", 5.0)
                .ion("PO4-3", "S_IP", 3.0)
                .water_ion("OH-", 1.0),
            MineralDefinition::new("X_DCPD", "brushite", 172.09, 6.59, 0.0, 0.6)
                .ion("Ca+2", "S_Ca", 1.0)
                .ion("HPO4-2", "S_IP", 1.0),
            MineralDefinition::new("X_OCP", "octacalcium phosphate", 491.2, 47.08, 0.0, 0.0072)
                .ion("Ca+2", "S_Ca", 4.0)
                .water_ion("H+", 1.0)
                .ion("PO4-3", "S_IP", 3.0),
            MineralDefinition::new("X_struv", "struvite", 245.41, 13.26, 22600.0, 3.6)
                .ion("Mg+2", "S_Mg", 1.0)
                .ion("NH4+", "S_IN", 1.0)
                .ion("PO4-3", "S_IP", 1.0),
            MineralDefinition::new("X_newb", "newberyite", 174.33, 5.8, 0.0, 0.12)
                .ion("Mg+2", "S_Mg", 1.0)
                .ion("HPO4-2", "S_IP", 1.0),
            MineralDefinition::new("X_magn", "magnesite", 84.31, 7.46, -25810.0, 0.024)
                .ion("Mg+2", "S_Mg", 1.0)
                .ion("CO3-2", "S_IC", 1.0),
            MineralDefinition::new("X_kstruv", "potassium struvite", 266.47, 10.6, 0.0, 0.12)
                .ion("Mg+2", "S_Mg", 1.0)
                .ion("K+", "S_K", 1.0)
                .ion("PO4-3", "S_IP", 1.0),
            // FeS + H+ = Fe+2 + HS-
            MineralDefinition::new("X_FeS", "iron sulfide", 87.91, 3.6, 0.0, 2.4)
                .ion("Fe+2", "S_Fe2", 1.0)
                .ion("HS-", "S_IS", 1.0)
                .water_ion("H+", -1.0),
            MineralDefinition::new("X_Fe3PO4", "strengite", 186.85, 26.4, 0.0, 0.12)
                .ion("Fe+3", "S_Fe3", 1.0)
                .ion("PO4-3", "S_IP", 1.0),
            MineralDefinition::new("X_AlPO4", "variscite", 157.98, 22.1, 0.0, 0.12)
                .ion("Al+3", "S_Al", 1.0)
                .ion("PO4-3", "S_IP", 1.0),
        ];
        Self { minerals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirteen_distinct_minerals() {
        let params = MineralParameters::default();
        assert_eq!(params.minerals.len(), 13);
        let mut ids: Vec<_> = params.minerals.iter().map(|m| m.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 13);
    }

    #[test]
    fn test_every_mineral_has_a_positive_ion_sum() {
        for mineral in MineralParameters::default().minerals {
            let sum: f64 = mineral.ions.iter().map(|i| i.power).sum();
            assert!(sum > 0.0, "{} has ion sum {}", mineral.id, sum);
        }
    }
}
