//! Acid-base equilibrium and the charge-balance pH solver.
//!
//! The liquid phase is described by:
//! - weak acid/base systems ([`WeakAcidSystem`]) whose total concentration is a state
//!   variable and whose speciation depends on pH, e.g. inorganic carbon
//!   (CO₂ / HCO₃⁻ / CO₃²⁻) or ammonium/ammonia,
//! - strong ions ([`StrongIon`]) that are fully dissociated, e.g. Na⁺ or Cl⁻,
//! - water self-ionisation.
//!
//! The hydrogen-ion concentration solves the electroneutrality condition
//!
//! $$ f(h) = h - \frac{K_w}{h} + \sum_s z_s c_s + \sum_w C_w (z_w - \bar{n}_w(h)) = 0 $$
//!
//! where $\bar{n}_w$ is the mean number of protons released by system $w$. Because
//! $f$ is strictly increasing in $h$ the root is unique; it is found in pH space by a
//! Newton iteration safeguarded by bisection over a bounded interval.

use crate::activity::{activity_coefficient, debye_huckel_a, IonicTerm};
use crate::component::ComponentRegistry;
use crate::errors::{AdmError, AdmResult};
use crate::numerics::{safeguarded_newton, RootFailure, RootSettings};
use crate::state::ConcentrationVector;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_10;
use tracing::warn;

/// Molar gas constant
/// unit: J/(mol K)
pub const R_J: f64 = 8.3145;

/// Species name of the free hydrogen ion.
pub const HYDROGEN_ION: &str = "H+";
/// Species name of the hydroxide ion.
pub const HYDROXIDE_ION: &str = "OH-";
/// Species name reported as free ammonia.
pub const FREE_AMMONIA: &str = "NH3";
/// Species name reported as dissolved carbon dioxide.
pub const DISSOLVED_CO2: &str = "CO2";

/// An equilibrium constant with a van't Hoff temperature correction.
///
/// $$ K(T) = K_{ref} \exp\left(\frac{\Delta H}{R}\left(\frac{1}{T_{ref}} - \frac{1}{T}\right)\right) $$
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VantHoff {
    /// Value at the reference temperature
    pub reference: f64,
    /// Reaction enthalpy
    /// unit: J/mol
    pub enthalpy: f64,
    /// unit: K
    pub reference_temperature: f64,
}

impl VantHoff {
    /// Standard reference temperature of tabulated constants
    pub const T_REF: f64 = 298.15;

    pub fn new(reference: f64, enthalpy: f64) -> Self {
        Self {
            reference,
            enthalpy,
            reference_temperature: Self::T_REF,
        }
    }

    /// Constant given as $pK = -\log_{10} K$.
    pub fn from_pk(pk: f64, enthalpy: f64) -> Self {
        Self::new(10f64.powf(-pk), enthalpy)
    }

    pub fn at(&self, temperature: f64) -> f64 {
        self.reference
            * (self.enthalpy / R_J * (1.0 / self.reference_temperature - 1.0 / temperature)).exp()
    }
}

/// A weak acid/base system speciated by its dissociation constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakAcidSystem {
    /// Component holding the total concentration
    pub component: String,
    /// Species names, most protonated first; one more than `constants`
    pub species: Vec<String>,
    /// Charge of the most protonated species
    pub top_charge: i32,
    /// Successive dissociation constants
    pub constants: Vec<VantHoff>,
}

impl WeakAcidSystem {
    pub fn monoprotic(
        component: &str,
        acid: &str,
        base: &str,
        top_charge: i32,
        constant: VantHoff,
    ) -> Self {
        Self {
            component: component.to_string(),
            species: vec![acid.to_string(), base.to_string()],
            top_charge,
            constants: vec![constant],
        }
    }

    fn validate(&self) -> AdmResult<()> {
        if self.species.len() != self.constants.len() + 1 || self.constants.is_empty() {
            return Err(AdmError::InvalidConfiguration(format!(
                "weak acid system '{}' needs one more species than dissociation constants",
                self.component
            )));
        }
        Ok(())
    }
}

/// Fractions of each species of a weak system at hydrogen-ion concentration `h`.
///
/// `ka` holds the successive dissociation constants; the result has one more entry.
pub fn dissociation_fractions(h: f64, ka: &[f64]) -> Vec<f64> {
    let mut terms = Vec::with_capacity(ka.len() + 1);
    let mut term = 1.0;
    terms.push(term);
    for k in ka {
        term *= k / h;
        terms.push(term);
    }
    let total: f64 = terms.iter().sum();
    terms.iter().map(|t| t / total).collect()
}

/// A fully dissociated ion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongIon {
    pub component: String,
    pub species: String,
    pub charge: i32,
}

impl StrongIon {
    pub fn new(component: &str, species: &str, charge: i32) -> Self {
        Self {
            component: component.to_string(),
            species: species.to_string(),
            charge,
        }
    }
}

/// Explicit, bounded loosening of the equilibrium tolerance.
///
/// Each attempt multiplies both tolerances by `factor`; every attempt is logged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRelaxation {
    pub factor: f64,
    pub max_attempts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquilibriumSettings {
    /// Convergence settings on the pH unknown
    pub root: RootSettings,
    /// Lower end of the pH search interval
    pub ph_lower: f64,
    /// Upper end of the pH search interval
    pub ph_upper: f64,
    /// Disabled unless set explicitly
    pub relaxation: Option<ToleranceRelaxation>,
}

impl Default for EquilibriumSettings {
    fn default() -> Self {
        Self {
            root: RootSettings {
                absolute_tolerance: 1e-12,
                relative_tolerance: 0.0,
                max_iterations: 100,
            },
            ph_lower: 0.0,
            ph_upper: 14.0,
            relaxation: None,
        }
    }
}

/// One speciated ion or molecule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// unit: kmol/m^3
    pub concentration: f64,
    pub charge: i32,
    /// unit: kmol/m^3
    pub activity: f64,
}

/// Derived equilibrium quantities for one right-hand-side evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumState {
    pub ph: f64,
    /// Free hydrogen-ion concentration
    /// unit: kmol/m^3
    pub h: f64,
    /// unit: kmol N/m^3
    pub free_ammonia: f64,
    /// unit: kmol C/m^3
    pub dissolved_co2: f64,
    /// unit: kmol/m^3
    pub ionic_strength: f64,
    pub species: IndexMap<String, Species>,
    pub iterations: usize,
}

impl EquilibriumState {
    /// Molar concentration of a species.
    pub fn species_concentration(&self, name: &str) -> AdmResult<f64> {
        self.species
            .get(name)
            .map(|s| s.concentration)
            .ok_or_else(|| AdmError::MissingComponent(format!("species {}", name)))
    }

    /// Activity of a species.
    pub fn activity(&self, name: &str) -> AdmResult<f64> {
        self.species
            .get(name)
            .map(|s| s.activity)
            .ok_or_else(|| AdmError::MissingComponent(format!("species {}", name)))
    }

    /// Activities of all charged species, keyed by species name.
    pub fn ion_activities(&self) -> IndexMap<String, f64> {
        self.species
            .iter()
            .filter(|(_, s)| s.charge != 0)
            .map(|(name, s)| (name.clone(), s.activity))
            .collect()
    }

    /// Total positive and negative charge (kmol charge/m³).
    pub fn charge_totals(&self) -> (f64, f64) {
        self.species
            .values()
            .fold((0.0, 0.0), |(cations, anions), s| match s.charge {
                z if z > 0 => (cations + z as f64 * s.concentration, anions),
                z if z < 0 => (cations, anions - z as f64 * s.concentration),
                _ => (cations, anions),
            })
    }
}

/// Temperature-evaluated constants.
#[derive(Debug, Clone, PartialEq)]
pub struct EquilibriumConstants {
    pub kw: f64,
    pub ka: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy)]
struct Totals<'a> {
    strong_charge: f64,
    weak: &'a [(f64, i32, &'a [f64])],
    kw: f64,
}

impl Totals<'_> {
    /// Charge balance and its derivative with respect to h.
    fn balance(&self, h: f64) -> (f64, f64) {
        let mut value = h - self.kw / h + self.strong_charge;
        let mut derivative = 1.0 + self.kw / (h * h);
        for &(total, top_charge, ka) in self.weak {
            if total <= 0.0 {
                continue;
            }
            let fractions = dissociation_fractions(h, ka);
            let (mean, mean_sq) = fractions
                .iter()
                .enumerate()
                .fold((0.0, 0.0), |(m, m2), (k, a)| {
                    (m + k as f64 * a, m2 + (k * k) as f64 * a)
                });
            value += total * (top_charge as f64 - mean);
            derivative += total * (mean_sq - mean * mean) / h;
        }
        (value, derivative)
    }
}

/// The acid-base description of a liquid phase.
///
/// Owns its constants, so independent configurations never share state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumSystem {
    pub water: VantHoff,
    pub weak: Vec<WeakAcidSystem>,
    pub strong: Vec<StrongIon>,
    pub settings: EquilibriumSettings,
    /// kmol per concentration unit of each weak system component
    weak_factors: Vec<f64>,
    /// kmol per concentration unit of each strong ion component
    strong_factors: Vec<f64>,
    /// Registry charges entering the ionic strength
    ionic_terms: Vec<IonicTerm>,
}

impl EquilibriumSystem {
    /// Build a system against a registry.
    ///
    /// # Errors
    ///
    /// Returns [`AdmError::UnknownComponent`] if a system references an unregistered
    /// component, or a configuration error for malformed weak systems.
    pub fn new(
        registry: &ComponentRegistry,
        water: VantHoff,
        weak: Vec<WeakAcidSystem>,
        strong: Vec<StrongIon>,
        settings: EquilibriumSettings,
    ) -> AdmResult<Self> {
        let mut weak_factors = Vec::with_capacity(weak.len());
        for system in &weak {
            system.validate()?;
            weak_factors.push(registry.get(&system.component)?.molar_factor());
        }
        let mut strong_factors = Vec::with_capacity(strong.len());
        for ion in &strong {
            strong_factors.push(registry.get(&ion.component)?.molar_factor());
        }
        if settings.ph_lower >= settings.ph_upper {
            return Err(AdmError::InvalidConfiguration(format!(
                "pH search interval [{}, {}] is empty",
                settings.ph_lower, settings.ph_upper
            )));
        }
        Ok(Self {
            water,
            weak,
            strong,
            settings,
            weak_factors,
            strong_factors,
            ionic_terms: IonicTerm::from_registry(registry),
        })
    }

    /// Names of every species this system can produce.
    pub fn species_names(&self) -> Vec<String> {
        let mut names = vec![HYDROGEN_ION.to_string(), HYDROXIDE_ION.to_string()];
        names.extend(self.strong.iter().map(|s| s.species.clone()));
        names.extend(self.weak.iter().flat_map(|w| w.species.iter().cloned()));
        names
    }

    /// Whether a component takes part in acid-base speciation or charge balance.
    pub fn involves(&self, component: &str) -> bool {
        self.weak.iter().any(|w| w.component == component)
            || self.strong.iter().any(|s| s.component == component)
    }

    pub fn constants_at(&self, temperature: f64) -> EquilibriumConstants {
        EquilibriumConstants {
            kw: self.water.at(temperature),
            ka: self
                .weak
                .iter()
                .map(|w| w.constants.iter().map(|k| k.at(temperature)).collect())
                .collect(),
        }
    }

    /// Equilibrium pH of a liquid concentration vector.
    pub fn solve_ph(&self, conc: &ConcentrationVector, temperature: f64) -> AdmResult<f64> {
        self.solve(conc, temperature).map(|state| state.ph)
    }

    /// Solve the charge balance and speciate every system.
    ///
    /// # Errors
    ///
    /// - [`AdmError::MissingComponent`] if a referenced component is absent from `conc`
    /// - [`AdmError::EquilibriumNonconvergence`] if no root lies inside the pH interval
    ///   or the iteration budget is exhausted
    pub fn solve(
        &self,
        conc: &ConcentrationVector,
        temperature: f64,
    ) -> AdmResult<EquilibriumState> {
        if !(temperature > 0.0) {
            return Err(AdmError::InvalidConfiguration(format!(
                "temperature must be positive, got {} K",
                temperature
            )));
        }
        let constants = self.constants_at(temperature);

        let mut strong_charge = 0.0;
        let mut strong_molar = Vec::with_capacity(self.strong.len());
        for (ion, factor) in self.strong.iter().zip(&self.strong_factors) {
            let c = conc.get(&ion.component)?.max(0.0) * factor;
            strong_charge += ion.charge as f64 * c;
            strong_molar.push(c);
        }
        let mut weak_totals = Vec::with_capacity(self.weak.len());
        for ((system, factor), ka) in self.weak.iter().zip(&self.weak_factors).zip(&constants.ka) {
            let total = conc.get(&system.component)?.max(0.0) * factor;
            weak_totals.push((total, system.top_charge, ka.as_slice()));
        }
        let totals = Totals {
            strong_charge,
            weak: &weak_totals,
            kw: constants.kw,
        };

        let root = self.find_ph(&totals)?;
        let ph = root.x;
        let h = 10f64.powf(-ph);

        let ionic_strength = IonicTerm::ionic_strength(&self.ionic_terms, conc);
        let a = debye_huckel_a(temperature);
        let mut species = IndexMap::new();
        let mut insert = |name: &str, concentration: f64, charge: i32| {
            let gamma = activity_coefficient(charge, ionic_strength, a);
            species.insert(
                name.to_string(),
                Species {
                    concentration,
                    charge,
                    activity: gamma * concentration,
                },
            );
        };
        insert(HYDROGEN_ION, h, 1);
        insert(HYDROXIDE_ION, constants.kw / h, -1);
        for (ion, c) in self.strong.iter().zip(strong_molar) {
            insert(&ion.species, c, ion.charge);
        }
        for (system, (total, top_charge, ka)) in self.weak.iter().zip(&weak_totals) {
            let fractions = dissociation_fractions(h, ka);
            for (k, (name, alpha)) in system.species.iter().zip(fractions).enumerate() {
                insert(name, total * alpha, top_charge - k as i32);
            }
        }

        let lookup = |name: &str| species.get(name).map(|s| s.concentration).unwrap_or(0.0);
        Ok(EquilibriumState {
            ph,
            h,
            free_ammonia: lookup(FREE_AMMONIA),
            dissolved_co2: lookup(DISSOLVED_CO2),
            ionic_strength,
            iterations: root.iterations,
            species,
        })
    }

    fn find_ph(&self, totals: &Totals) -> AdmResult<crate::numerics::Root> {
        let balance_in_ph = |ph: f64| {
            let h = 10f64.powf(-ph);
            let (value, dh) = totals.balance(h);
            (value, -LN_10 * h * dh)
        };
        let settings = &self.settings;
        let attempt = |root: &RootSettings| {
            safeguarded_newton(
                balance_in_ph,
                settings.ph_lower,
                settings.ph_upper,
                None,
                root,
            )
        };

        match (attempt(&settings.root), settings.relaxation) {
            (Ok(root), _) => Ok(root),
            (Err(RootFailure::IterationLimit { .. }), Some(relaxation)) => {
                let mut last = None;
                for n in 1..=relaxation.max_attempts {
                    let relaxed = settings.root.relaxed(relaxation.factor.powi(n as i32));
                    warn!(
                        attempt = n,
                        absolute_tolerance = relaxed.absolute_tolerance,
                        "pH solver did not converge; retrying with relaxed tolerance"
                    );
                    match attempt(&relaxed) {
                        Ok(root) => return Ok(root),
                        Err(e) => last = Some(e),
                    }
                }
                Err(AdmError::nonconvergence(
                    "pH solver",
                    last.map(|e| e.to_string())
                        .unwrap_or_else(|| "relaxation exhausted".to_string()),
                ))
            }
            (Err(e), _) => Err(AdmError::nonconvergence("pH solver", e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::state::layout;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        for c in [
            Component::ion("S_IC", "C", 12.011, -1),
            Component::ion("S_IN", "N", 14.007, 1),
            Component::organic(
                "S_ac",
                crate::component::PhaseClass::Soluble,
                60.05,
                64.0 / 60.05,
            )
            .with_charge(-1),
            Component::ion("S_Na", "Na", 22.99, 1),
            Component::ion("S_Cl", "Cl", 35.45, -1),
        ] {
            registry.register(c).unwrap();
        }
        registry
    }

    fn system(registry: &ComponentRegistry) -> EquilibriumSystem {
        EquilibriumSystem::new(
            registry,
            VantHoff::from_pk(14.0, 55900.0),
            vec![
                WeakAcidSystem {
                    component: "S_IC".to_string(),
                    species: vec!["CO2".into(), "HCO3-".into(), "CO3-2".into()],
                    top_charge: 0,
                    constants: vec![
                        VantHoff::from_pk(6.35, 7646.0),
                        VantHoff::from_pk(10.33, 14850.0),
                    ],
                },
                WeakAcidSystem::monoprotic("S_IN", "NH4+", "NH3", 1, VantHoff::from_pk(9.25, 51965.0)),
                WeakAcidSystem::monoprotic("S_ac", "HAc", "Ac-", 0, VantHoff::from_pk(4.76, 0.0)),
            ],
            vec![StrongIon::new("S_Na", "Na+", 1), StrongIon::new("S_Cl", "Cl-", -1)],
            EquilibriumSettings::default(),
        )
        .unwrap()
    }

    fn digester_liquor(registry: &ComponentRegistry) -> ConcentrationVector {
        let ids = registry.all_ids();
        ConcentrationVector::from_values(layout(&ids), vec![0.1527, 0.1302, 0.1976, 0.04, 0.02])
            .unwrap()
    }

    #[test]
    fn test_dissociation_fractions_sum_to_one() {
        let fractions = dissociation_fractions(1e-7, &[4.5e-7, 4.7e-11]);
        assert_relative_eq!(fractions.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(fractions[1] > fractions[0]);
    }

    #[test]
    fn test_vant_hoff_at_reference_is_reference() {
        let k = VantHoff::from_pk(9.25, 51965.0);
        assert_relative_eq!(k.at(298.15), 10f64.powf(-9.25), epsilon = 1e-20);
        // Endothermic dissociation increases with temperature
        assert!(k.at(308.15) > k.at(298.15));
    }

    #[test]
    fn test_charge_balance_closes() {
        let registry = registry();
        let system = system(&registry);
        let state = system.solve(&digester_liquor(&registry), 308.15).unwrap();

        let (cations, anions) = state.charge_totals();
        let mean = 0.5 * (cations + anions);
        assert!((cations - anions).abs() / mean < 0.05);
        assert!(state.ph > 6.5 && state.ph < 8.5, "pH {}", state.ph);
    }

    #[test]
    fn test_solve_is_idempotent() {
        let registry = registry();
        let system = system(&registry);
        let conc = digester_liquor(&registry);
        let a = system.solve_ph(&conc, 308.15).unwrap();
        let b = system.solve_ph(&conc, 308.15).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pure_water_is_neutral() {
        let registry = registry();
        let system = system(&registry);
        let conc = ConcentrationVector::zeros(layout(&registry.all_ids()));
        let ph = system.solve_ph(&conc, 298.15).unwrap();
        assert_abs_diff_eq!(ph, 7.0, epsilon = 1e-6);
    }

    #[test]
    fn test_strong_acid_lowers_ph() {
        let registry = registry();
        let system = system(&registry);
        let mut conc = ConcentrationVector::zeros(layout(&registry.all_ids()));
        conc.set("S_Cl", 1e-3).unwrap();
        let ph = system.solve_ph(&conc, 298.15).unwrap();
        assert_abs_diff_eq!(ph, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_unbracketed_root_is_surfaced() {
        let registry = registry();
        let mut system = system(&registry);
        system.settings.ph_lower = 8.0;
        system.settings.ph_upper = 9.0;
        let mut conc = ConcentrationVector::zeros(layout(&registry.all_ids()));
        conc.set("S_Cl", 1e-3).unwrap();
        let err = system.solve_ph(&conc, 298.15).unwrap_err();
        assert!(matches!(err, AdmError::EquilibriumNonconvergence { .. }));
    }

    #[test]
    fn test_iteration_budget_is_surfaced() {
        let registry = registry();
        let mut system = system(&registry);
        system.settings.root.max_iterations = 1;
        let err = system
            .solve_ph(&digester_liquor(&registry), 308.15)
            .unwrap_err();
        assert!(matches!(err, AdmError::EquilibriumNonconvergence { .. }));
    }

    #[test]
    fn test_explicit_relaxation_is_bounded() {
        let registry = registry();
        let mut system = system(&registry);
        system.settings.root.max_iterations = 1;
        system.settings.relaxation = Some(ToleranceRelaxation {
            factor: 10.0,
            max_attempts: 2,
        });
        // Two relaxations of 1e-12 cannot rescue a one-iteration budget
        assert!(system.solve_ph(&digester_liquor(&registry), 308.15).is_err());
    }

    #[test]
    fn test_missing_component_is_an_error() {
        let registry = registry();
        let system = system(&registry);
        let conc = ConcentrationVector::zeros(layout(&["S_IC", "S_IN"]));
        assert!(matches!(
            system.solve_ph(&conc, 308.15).unwrap_err(),
            AdmError::MissingComponent(_)
        ));
    }
}
