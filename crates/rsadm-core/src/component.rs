//! Chemical component registry.
//!
//! Every state variable of a reactor model is a [`Component`] registered in a
//! [`ComponentRegistry`]. The registration order defines the index mapping used by
//! concentration vectors and stoichiometric matrices, so it must stay stable for the
//! lifetime of a simulation run.
//!
//! # Units
//!
//! A concentration is expressed per m³ of liquid (or headspace for gas components)
//! in the basis described by the pair ([`MeasuredAs`], [`Basis`]):
//!
//! | measured as | basis | unit |
//! |-------------|-------|------|
//! | `Cod` | `Mass` | kg COD / m³ |
//! | `Element("N")` | `Molar` | kmol N / m³ |
//! | `Molecule` | `Mass` | kg / m³ |
//!
//! Conversions between mass, molar and COD bases always go through
//! [`Component::molar_factor`] and [`Component::cod_factor`], which only use the
//! component's own `molar_mass` and `cod_equivalent`.

use crate::errors::{AdmError, AdmResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Phase class of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseClass {
    Soluble,
    Particulate,
    Gas,
    Mineral,
}

impl PhaseClass {
    /// Whether components of this class live in the liquid phase.
    pub fn is_liquid(&self) -> bool {
        !matches!(self, PhaseClass::Gas)
    }
}

/// The chemical basis a concentration is expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasuredAs {
    /// Chemical oxygen demand
    Cod,
    /// A single element of the species, e.g. nitrogen for ammonium
    Element(String),
    /// The full molecule or mineral formula unit
    Molecule,
}

/// Whether a concentration counts mass or moles of the `measured_as` basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    Mass,
    Molar,
}

/// Elemental content used to close carbon, nitrogen and phosphorus balances.
///
/// unit: kmol element per unit of the component's concentration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementalContent {
    pub carbon: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
}

impl ElementalContent {
    pub fn new(carbon: f64, nitrogen: f64, phosphorus: f64) -> Self {
        Self {
            carbon,
            nitrogen,
            phosphorus,
        }
    }
}

/// An entry in the component registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier, e.g. `S_ac`
    pub id: String,
    /// Molar mass of the `measured_as` basis (of the molecule for COD species)
    /// unit: kg/kmol
    pub molar_mass: f64,
    /// Charge of the dominant form at neutral pH
    pub charge: i32,
    /// Oxygen demand per unit mass of the `measured_as` basis
    /// unit: kg COD/kg
    pub cod_equivalent: f64,
    pub phase_class: PhaseClass,
    pub measured_as: MeasuredAs,
    pub basis: Basis,
    #[serde(default)]
    pub content: ElementalContent,
    #[serde(default)]
    pub description: String,
}

impl Component {
    pub fn new(
        id: impl Into<String>,
        phase_class: PhaseClass,
        measured_as: MeasuredAs,
        basis: Basis,
        molar_mass: f64,
    ) -> Self {
        Self {
            id: id.into(),
            molar_mass,
            charge: 0,
            cod_equivalent: 0.0,
            phase_class,
            measured_as,
            basis,
            content: ElementalContent::default(),
            description: String::new(),
        }
    }

    /// An organic species measured as COD (kg COD/m³).
    pub fn organic(
        id: impl Into<String>,
        phase_class: PhaseClass,
        molar_mass: f64,
        cod_equivalent: f64,
    ) -> Self {
        Self::new(id, phase_class, MeasuredAs::Cod, Basis::Mass, molar_mass)
            .with_cod(cod_equivalent)
    }

    /// An inorganic species measured in kmol of `element` per m³.
    pub fn ion(id: impl Into<String>, element: &str, molar_mass: f64, charge: i32) -> Self {
        Self::new(
            id,
            PhaseClass::Soluble,
            MeasuredAs::Element(element.to_string()),
            Basis::Molar,
            molar_mass,
        )
        .with_charge(charge)
    }

    /// A mineral tracked as kg of formula unit per m³.
    pub fn mineral(id: impl Into<String>, molar_mass: f64) -> Self {
        Self::new(
            id,
            PhaseClass::Mineral,
            MeasuredAs::Molecule,
            Basis::Mass,
            molar_mass,
        )
    }

    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_cod(mut self, cod_equivalent: f64) -> Self {
        self.cod_equivalent = cod_equivalent;
        self
    }

    pub fn with_content(mut self, content: ElementalContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// kmol of the species per unit of concentration.
    ///
    /// COD-measured species are first converted to mass through `cod_equivalent`.
    pub fn molar_factor(&self) -> f64 {
        match (self.basis, &self.measured_as) {
            (Basis::Molar, _) => 1.0,
            (Basis::Mass, MeasuredAs::Cod) => {
                let cod_per_kmol = self.cod_equivalent * self.molar_mass;
                if cod_per_kmol > 0.0 {
                    1.0 / cod_per_kmol
                } else {
                    0.0
                }
            }
            (Basis::Mass, _) => {
                if self.molar_mass > 0.0 {
                    1.0 / self.molar_mass
                } else {
                    0.0
                }
            }
        }
    }

    /// kg COD per unit of concentration.
    pub fn cod_factor(&self) -> f64 {
        match (self.basis, &self.measured_as) {
            (Basis::Mass, MeasuredAs::Cod) => 1.0,
            (Basis::Mass, _) => self.cod_equivalent,
            (Basis::Molar, _) => self.cod_equivalent * self.molar_mass,
        }
    }

    /// kg of the `measured_as` basis per unit of concentration.
    pub fn mass_factor(&self) -> f64 {
        match (self.basis, &self.measured_as) {
            (Basis::Mass, MeasuredAs::Cod) => {
                if self.cod_equivalent > 0.0 {
                    1.0 / self.cod_equivalent
                } else {
                    0.0
                }
            }
            (Basis::Mass, _) => 1.0,
            (Basis::Molar, _) => self.molar_mass,
        }
    }

    /// Human readable concentration unit.
    pub fn unit(&self) -> String {
        match (self.basis, &self.measured_as) {
            (Basis::Mass, MeasuredAs::Cod) => "kg COD/m^3".to_string(),
            (Basis::Mass, MeasuredAs::Element(e)) => format!("kg {}/m^3", e),
            (Basis::Mass, MeasuredAs::Molecule) => "kg/m^3".to_string(),
            (Basis::Molar, MeasuredAs::Element(e)) => format!("kmol {}/m^3", e),
            (Basis::Molar, _) => "kmol/m^3".to_string(),
        }
    }
}

/// Ordered set of components keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentRegistry {
    components: IndexMap<String, Component>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component.
    ///
    /// # Errors
    ///
    /// Returns [`AdmError::DuplicateComponent`] if the id is already present.
    pub fn register(&mut self, component: Component) -> AdmResult<()> {
        if self.components.contains_key(&component.id) {
            return Err(AdmError::DuplicateComponent(component.id));
        }
        self.components.insert(component.id.clone(), component);
        Ok(())
    }

    pub fn get(&self, id: &str) -> AdmResult<&Component> {
        self.components
            .get(id)
            .ok_or_else(|| AdmError::UnknownComponent(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    /// Position of a component in registration order.
    pub fn index_of(&self, id: &str) -> AdmResult<usize> {
        self.components
            .get_index_of(id)
            .ok_or_else(|| AdmError::UnknownComponent(id.to_string()))
    }

    /// All ids in registration order.
    pub fn all_ids(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    /// Ids of the components that live in the liquid phase, in registration order.
    pub fn liquid_ids(&self) -> Vec<String> {
        self.ids_where(|c| c.phase_class.is_liquid())
    }

    /// Ids of the headspace components, in registration order.
    pub fn gas_ids(&self) -> Vec<String> {
        self.ids_where(|c| c.phase_class == PhaseClass::Gas)
    }

    pub fn ids_where(&self, predicate: impl Fn(&Component) -> bool) -> Vec<String> {
        self.components
            .values()
            .filter(|c| predicate(c))
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn acetate() -> Component {
        Component::organic("S_ac", PhaseClass::Soluble, 60.05, 64.0 / 60.05)
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ComponentRegistry::new();
        registry.register(acetate()).unwrap();
        let err = registry.register(acetate()).unwrap_err();
        assert_eq!(err, AdmError::DuplicateComponent("S_ac".to_string()));
    }

    #[test]
    fn test_unknown_component() {
        let registry = ComponentRegistry::new();
        assert_eq!(
            registry.get("S_xx").unwrap_err(),
            AdmError::UnknownComponent("S_xx".to_string())
        );
    }

    #[test]
    fn test_order_is_registration_order() {
        let mut registry = ComponentRegistry::new();
        registry
            .register(Component::ion("S_Na", "Na", 22.99, 1))
            .unwrap();
        registry.register(acetate()).unwrap();
        registry
            .register(Component::new(
                "S_gas_ch4",
                PhaseClass::Gas,
                MeasuredAs::Cod,
                Basis::Mass,
                16.04,
            ))
            .unwrap();

        assert_eq!(registry.all_ids(), vec!["S_Na", "S_ac", "S_gas_ch4"]);
        assert_eq!(registry.liquid_ids(), vec!["S_Na", "S_ac"]);
        assert_eq!(registry.gas_ids(), vec!["S_gas_ch4"]);
        assert_eq!(registry.index_of("S_ac").unwrap(), 1);
    }

    #[test]
    fn test_cod_species_conversions() {
        let ac = acetate();
        // 64 kg COD per kmol of acetate
        assert_relative_eq!(ac.molar_factor(), 1.0 / 64.0, epsilon = 1e-12);
        assert_relative_eq!(ac.cod_factor(), 1.0);
        assert_relative_eq!(ac.mass_factor(), 60.05 / 64.0, epsilon = 1e-12);
        assert_eq!(ac.unit(), "kg COD/m^3");
    }

    #[test]
    fn test_molar_species_conversions() {
        let sulfide = Component::ion("S_IS", "S", 32.06, 0).with_cod(2.0);
        assert_relative_eq!(sulfide.molar_factor(), 1.0);
        // 64.12 kg COD per kmol S
        assert_relative_eq!(sulfide.cod_factor(), 64.12, epsilon = 1e-12);
        assert_eq!(sulfide.unit(), "kmol S/m^3");

        let struvite = Component::mineral("X_struv", 245.41);
        assert_relative_eq!(struvite.molar_factor(), 1.0 / 245.41, epsilon = 1e-12);
        assert_relative_eq!(struvite.cod_factor(), 0.0);
    }
}
