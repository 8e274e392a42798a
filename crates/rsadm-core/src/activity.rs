//! Ionic strength, activity coefficients and mineral saturation.
//!
//! Activities follow the Davies extension of Debye-Hückel:
//!
//! $$ \log_{10}\gamma = -A z^2 \left( \frac{\sqrt{I}}{1+\sqrt{I}} - 0.3 I \right) $$
//!
//! which is reasonable up to an ionic strength of about 0.5 M.
//!
//! # Precipitation kinetics
//!
//! The rate of a mineral uses a signed driving force so that the direction of the
//! reaction survives even kinetic orders:
//!
//! $$ r = k \cdot X \cdot \mathrm{sign}(d) |d|^n, \quad d = SI - 1 $$
//!
//! where $SI$ is already the $\Sigma\nu$-th root of the saturation ratio. Dissolution of
//! an exhausted mineral is suppressed.

use crate::component::ComponentRegistry;
use crate::equilibrium::{EquilibriumState, VantHoff};
use crate::errors::{AdmError, AdmResult};
use crate::numerics::signed_pow;
use crate::state::ConcentrationVector;
use serde::{Deserialize, Serialize};

/// Mineral mass at or below which dissolution is switched off
/// unit: kg/m^3
pub const DISSOLUTION_MASS_FLOOR: f64 = 1e-12;

/// A charged registry component and its conversion to molar units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonicTerm {
    pub component: String,
    pub molar_factor: f64,
    pub charge: i32,
}

impl IonicTerm {
    /// Every charged liquid component of the registry.
    pub fn from_registry(registry: &ComponentRegistry) -> Vec<IonicTerm> {
        registry
            .iter()
            .filter(|c| c.charge != 0 && c.phase_class.is_liquid())
            .map(|c| IonicTerm {
                component: c.id.clone(),
                molar_factor: c.molar_factor(),
                charge: c.charge,
            })
            .collect()
    }

    /// Ionic strength over the given terms. Components absent from `conc` contribute zero.
    pub fn ionic_strength(terms: &[IonicTerm], conc: &ConcentrationVector) -> f64 {
        0.5 * terms
            .iter()
            .filter_map(|t| {
                conc.index_of(&t.component).map(|i| {
                    let c = conc.values()[i].max(0.0) * t.molar_factor;
                    c * (t.charge * t.charge) as f64
                })
            })
            .sum::<f64>()
    }
}

/// Ionic strength of a liquid vector using the charges held in the registry.
///
/// unit: kmol/m^3 (equivalently mol/L)
pub fn ionic_strength(conc: &ConcentrationVector, registry: &ComponentRegistry) -> f64 {
    IonicTerm::ionic_strength(&IonicTerm::from_registry(registry), conc)
}

/// Debye-Hückel `A` parameter of water at `temperature` (K).
pub fn debye_huckel_a(temperature: f64) -> f64 {
    let t = temperature - 273.15;
    let permittivity = 87.74 - 0.4008 * t + 9.398e-4 * t * t - 1.41e-6 * t * t * t;
    1.82e6 * (permittivity * temperature).powf(-1.5)
}

/// Davies activity coefficient of an ion with charge `charge`.
pub fn activity_coefficient(charge: i32, ionic_strength: f64, a: f64) -> f64 {
    if charge == 0 || ionic_strength <= 0.0 {
        return 1.0;
    }
    let sqrt_i = ionic_strength.sqrt();
    let log_gamma =
        -a * (charge * charge) as f64 * (sqrt_i / (1.0 + sqrt_i) - 0.3 * ionic_strength);
    10f64.powf(log_gamma)
}

/// One ion in a mineral's dissolution reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineralIon {
    /// Species name as produced by the equilibrium solver
    pub species: String,
    /// Stoichiometric coefficient in the ion activity product
    pub power: f64,
}

impl MineralIon {
    pub fn new(species: &str, power: f64) -> Self {
        Self {
            species: species.to_string(),
            power,
        }
    }
}

/// A mineral that may precipitate from, or dissolve into, the liquid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mineral {
    /// Registry component holding the precipitated mass
    pub component: String,
    pub ions: Vec<MineralIon>,
    /// Solubility product in activity terms
    pub solubility: VantHoff,
    /// unit: 1/d
    pub rate_constant: f64,
    pub kinetic_order: f64,
}

impl Mineral {
    pub fn stoichiometric_sum(&self) -> f64 {
        self.ions.iter().map(|i| i.power).sum()
    }

    /// Ion activity product at the given equilibrium state.
    pub fn ion_product(&self, equilibrium: &EquilibriumState) -> AdmResult<f64> {
        self.ions.iter().try_fold(1.0, |product, ion| {
            let activity = equilibrium.activity(&ion.species)?;
            Ok(product * activity.max(0.0).powf(ion.power))
        })
    }
}

/// Per-mineral saturation diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationRecord {
    pub mineral: String,
    pub ion_product: f64,
    /// Temperature-corrected solubility product
    pub solubility_product: f64,
    /// `ion_product / solubility_product`
    pub saturation_ratio: f64,
    /// Saturation ratio raised to `1/Σν`
    pub saturation_index: f64,
}

impl SaturationRecord {
    pub fn is_supersaturated(&self) -> bool {
        self.saturation_index > 1.0
    }
}

/// Saturation index of a mineral from already-computed activities.
pub fn saturation_index(
    mineral: &Mineral,
    equilibrium: &EquilibriumState,
    temperature: f64,
) -> AdmResult<SaturationRecord> {
    let sum = mineral.stoichiometric_sum();
    if !(sum > 0.0) {
        return Err(AdmError::InvalidConfiguration(format!(
            "mineral '{}' has no dissolving ions",
            mineral.component
        )));
    }
    let ion_product = mineral.ion_product(equilibrium)?;
    let solubility_product = mineral.solubility.at(temperature);
    let saturation_ratio = ion_product / solubility_product;
    Ok(SaturationRecord {
        mineral: mineral.component.clone(),
        ion_product,
        solubility_product,
        saturation_ratio,
        saturation_index: saturation_ratio.powf(1.0 / sum),
    })
}

/// Signed precipitation rate (kg/m³/d); negative values dissolve the mineral.
///
/// Positive above saturation, negative below and exactly zero at `SI == 1`. When the
/// mineral mass is at or below [`DISSOLUTION_MASS_FLOOR`] a negative rate is clamped to
/// zero; precipitation is never clamped.
pub fn precipitation_rate(
    saturation_index: f64,
    mass: f64,
    rate_constant: f64,
    kinetic_order: f64,
) -> f64 {
    let driving_force = saturation_index - 1.0;
    let rate = rate_constant * mass.max(0.0) * signed_pow(driving_force, kinetic_order);
    if rate < 0.0 && mass <= DISSOLUTION_MASS_FLOOR {
        0.0
    } else {
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::equilibrium::Species;
    use crate::state::layout;
    use approx::assert_relative_eq;
    use indexmap::IndexMap;

    #[test]
    fn test_ionic_strength_of_a_tap_water() {
        let mut registry = ComponentRegistry::new();
        registry
            .register(Component::ion("S_Na", "Na", 22.99, 1))
            .unwrap();
        registry
            .register(Component::ion("S_Cl", "Cl", 35.45, -1))
            .unwrap();
        registry
            .register(Component::ion("S_Ca", "Ca", 40.08, 2))
            .unwrap();
        registry
            .register(Component::ion("S_Mg", "Mg", 24.31, 2))
            .unwrap();
        let conc = ConcentrationVector::from_values(
            layout(&["S_Na", "S_Cl", "S_Ca", "S_Mg"]),
            vec![0.00435, 0.00282, 0.00125, 0.00104],
        )
        .unwrap();
        assert_relative_eq!(ionic_strength(&conc, &registry), 0.00816, epsilon = 1e-5);

        // Components absent from the vector contribute nothing
        let partial =
            ConcentrationVector::from_values(layout(&["S_Na"]), vec![0.01]).unwrap();
        assert_relative_eq!(ionic_strength(&partial, &registry), 0.005);
    }

    #[test]
    fn test_activity_coefficient_bounds() {
        let a = debye_huckel_a(298.15);
        assert_relative_eq!(a, 0.51, epsilon = 5e-3);
        assert_eq!(activity_coefficient(0, 0.1, a), 1.0);
        assert_eq!(activity_coefficient(2, 0.0, a), 1.0);
        for i in [1e-4, 1e-2, 0.1, 0.49] {
            for z in [-2, -1, 1, 3] {
                let gamma = activity_coefficient(z, i, a);
                assert!(gamma > 0.0 && gamma < 1.0, "z={} I={} gamma={}", z, i, gamma);
            }
            assert!(activity_coefficient(2, i, a) < activity_coefficient(1, i, a));
        }
    }

    #[test]
    fn test_precipitation_sign_law() {
        for order in [1.0, 2.0, 3.0] {
            assert!(precipitation_rate(1.5, 0.1, 1.0, order) > 0.0);
            assert!(precipitation_rate(0.5, 0.1, 1.0, order) < 0.0);
            assert_eq!(precipitation_rate(1.0, 0.1, 1.0, order), 0.0);
        }
    }

    #[test]
    fn test_exhausted_mineral_does_not_dissolve() {
        assert_eq!(precipitation_rate(0.2, 0.0, 5.0, 2.0), 0.0);
        assert_eq!(precipitation_rate(0.2, DISSOLUTION_MASS_FLOOR, 5.0, 2.0), 0.0);
        assert!(precipitation_rate(0.2, 1e-6, 5.0, 2.0) < 0.0);
    }

    fn state_with(species: &[(&str, f64, i32)]) -> EquilibriumState {
        let species: IndexMap<String, Species> = species
            .iter()
            .map(|(name, c, z)| {
                (
                    name.to_string(),
                    Species {
                        concentration: *c,
                        charge: *z,
                        activity: *c,
                    },
                )
            })
            .collect();
        EquilibriumState {
            ph: 7.0,
            h: 1e-7,
            free_ammonia: 0.0,
            dissolved_co2: 0.0,
            ionic_strength: 0.0,
            species,
            iterations: 0,
        }
    }

    #[test]
    fn test_saturation_index_takes_root_of_ratio() {
        let mineral = Mineral {
            component: "X_CCM".to_string(),
            ions: vec![MineralIon::new("Ca+2", 1.0), MineralIon::new("CO3-2", 1.0)],
            solubility: VantHoff::new(1e-8, 0.0),
            rate_constant: 1.0,
            kinetic_order: 2.0,
        };
        let state = state_with(&[("Ca+2", 1e-3, 2), ("CO3-2", 4e-5, -2)]);
        let record = saturation_index(&mineral, &state, 298.15).unwrap();
        assert_relative_eq!(record.saturation_ratio, 4.0, epsilon = 1e-9);
        assert_relative_eq!(record.saturation_index, 2.0, epsilon = 1e-9);
        assert!(record.is_supersaturated());

        let missing = state_with(&[("Ca+2", 1e-3, 2)]);
        assert!(saturation_index(&mineral, &missing, 298.15).is_err());
    }
}
