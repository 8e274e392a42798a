//! Processes, rate laws and the stoichiometric matrix.
//!
//! A [`Process`] pairs a rate law with a row of stoichiometric coefficients over the
//! liquid components. The [`RateTable`] evaluates every law and maps the rate vector
//! back onto component derivatives through the transposed stoichiometric matrix.
//!
//! Rate laws are trait objects serialised through `typetag`, so a complete reaction
//! network can be written to and read from JSON or TOML.

use crate::activity::{precipitation_rate, SaturationRecord};
use crate::component::{Component, ComponentRegistry};
use crate::equilibrium::{EquilibriumState, VantHoff};
use crate::errors::{AdmError, AdmResult};
use crate::inhibition::{combined, monod, InhibitionTerm, Target};
use crate::state::{ConcentrationVector, Layout};
use indexmap::IndexMap;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Small constant keeping competing-substrate shares finite when all substrates vanish
const SHARE_OFFSET: f64 = 1e-6;

/// Everything a rate law may read.
#[derive(Debug, Clone, Copy)]
pub struct RateContext<'a> {
    /// Liquid concentrations, never negative
    pub conc: &'a ConcentrationVector,
    /// unit: K
    pub temperature: f64,
    pub equilibrium: &'a EquilibriumState,
    /// Keyed by mineral component id
    pub saturation: &'a IndexMap<String, SaturationRecord>,
    /// Keyed by gas component id
    /// unit: bar
    pub partial_pressures: &'a IndexMap<String, f64>,
}

#[typetag::serde(tag = "law")]
pub trait RateLaw: Debug + Send + Sync {
    /// Volumetric rate of the process.
    fn rate(&self, ctx: &RateContext) -> AdmResult<f64>;

    /// Registry components the law reads.
    fn components(&self) -> Vec<String>;

    fn inhibitions(&self) -> &[InhibitionTerm] {
        &[]
    }
}

/// `k · S · I`; used for disintegration, hydrolysis and decay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstOrder {
    pub substrate: String,
    /// unit: 1/d
    pub k: f64,
    #[serde(default)]
    pub inhibitions: Vec<InhibitionTerm>,
}

impl FirstOrder {
    pub fn new(substrate: &str, k: f64) -> Self {
        Self {
            substrate: substrate.to_string(),
            k,
            inhibitions: vec![],
        }
    }
}

#[typetag::serde]
impl RateLaw for FirstOrder {
    fn rate(&self, ctx: &RateContext) -> AdmResult<f64> {
        let (inhibition, _) = combined(&self.inhibitions, ctx.conc, ctx.equilibrium)?;
        Ok(self.k * ctx.conc.get(&self.substrate)? * inhibition)
    }

    fn components(&self) -> Vec<String> {
        let mut ids = vec![self.substrate.clone()];
        ids.extend(self.inhibitions.iter().flat_map(|t| t.component_ids()));
        ids
    }

    fn inhibitions(&self) -> &[InhibitionTerm] {
        &self.inhibitions
    }
}

/// Limitation by the ratio of two components, e.g. stored polyphosphate per PAO.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioLimitation {
    pub numerator: String,
    pub denominator: String,
    pub k: f64,
}

/// Monod uptake `k_m · S/(K_S + S) · X · I`, optionally sharing the biomass between
/// competing substrates and limited by a storage ratio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonodUptake {
    pub substrate: String,
    pub biomass: String,
    /// unit: 1/d
    pub k_m: f64,
    pub k_s: f64,
    #[serde(default)]
    pub inhibitions: Vec<InhibitionTerm>,
    /// Competing substrates consumed by the same biomass
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub ratio_limitation: Option<RatioLimitation>,
}

impl MonodUptake {
    pub fn new(substrate: &str, biomass: &str, k_m: f64, k_s: f64) -> Self {
        Self {
            substrate: substrate.to_string(),
            biomass: biomass.to_string(),
            k_m,
            k_s,
            inhibitions: vec![],
            shared_with: vec![],
            ratio_limitation: None,
        }
    }

    pub fn with_inhibitions(mut self, inhibitions: Vec<InhibitionTerm>) -> Self {
        self.inhibitions = inhibitions;
        self
    }

    pub fn shared_with(mut self, others: &[&str]) -> Self {
        self.shared_with = others.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_ratio_limitation(mut self, numerator: &str, denominator: &str, k: f64) -> Self {
        self.ratio_limitation = Some(RatioLimitation {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            k,
        });
        self
    }
}

#[typetag::serde]
impl RateLaw for MonodUptake {
    fn rate(&self, ctx: &RateContext) -> AdmResult<f64> {
        let s = ctx.conc.get(&self.substrate)?;
        let x = ctx.conc.get(&self.biomass)?;
        let (inhibition, _) = combined(&self.inhibitions, ctx.conc, ctx.equilibrium)?;
        let mut rate = self.k_m * monod(s, self.k_s) * x * inhibition;

        if !self.shared_with.is_empty() {
            let mut total = s;
            for other in &self.shared_with {
                total += ctx.conc.get(other)?;
            }
            rate *= s / (total + SHARE_OFFSET);
        }
        if let Some(ratio) = &self.ratio_limitation {
            let denominator = ctx.conc.get(&ratio.denominator)?;
            let numerator = ctx.conc.get(&ratio.numerator)?;
            let fraction = if denominator > 0.0 {
                numerator / denominator
            } else {
                0.0
            };
            rate *= monod(fraction, ratio.k);
        }
        Ok(rate)
    }

    fn components(&self) -> Vec<String> {
        let mut ids = vec![self.substrate.clone(), self.biomass.clone()];
        ids.extend(self.shared_with.iter().cloned());
        if let Some(ratio) = &self.ratio_limitation {
            ids.push(ratio.numerator.clone());
            ids.push(ratio.denominator.clone());
        }
        ids.extend(self.inhibitions.iter().flat_map(|t| t.component_ids()));
        ids
    }

    fn inhibitions(&self) -> &[InhibitionTerm] {
        &self.inhibitions
    }
}

/// Mass-action chemistry `k · Π c_i^{order_i}`, e.g. abiotic iron reduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassAction {
    /// Reactant and reaction order
    pub reactants: Vec<(Target, f64)>,
    pub k: f64,
}

#[typetag::serde]
impl RateLaw for MassAction {
    fn rate(&self, ctx: &RateContext) -> AdmResult<f64> {
        self.reactants
            .iter()
            .try_fold(self.k, |rate, (reactant, order)| {
                let c = match reactant {
                    Target::Component(id) => ctx.conc.get(id)?,
                    Target::Species(name) => ctx.equilibrium.species_concentration(name)?,
                };
                Ok(rate * c.max(0.0).powf(*order))
            })
    }

    fn components(&self) -> Vec<String> {
        self.reactants
            .iter()
            .filter_map(|(r, _)| match r {
                Target::Component(id) => Some(id.clone()),
                Target::Species(_) => None,
            })
            .collect()
    }
}

/// Precipitation (positive) or dissolution (negative) of a mineral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Precipitation {
    pub mineral: String,
    /// unit: 1/d
    pub rate_constant: f64,
    pub kinetic_order: f64,
}

#[typetag::serde]
impl RateLaw for Precipitation {
    fn rate(&self, ctx: &RateContext) -> AdmResult<f64> {
        let record = ctx
            .saturation
            .get(&self.mineral)
            .ok_or_else(|| AdmError::MissingComponent(format!("saturation of {}", self.mineral)))?;
        let mass = ctx.conc.get(&self.mineral)?;
        Ok(precipitation_rate(
            record.saturation_index,
            mass,
            self.rate_constant,
            self.kinetic_order,
        ))
    }

    fn components(&self) -> Vec<String> {
        vec![self.mineral.clone()]
    }
}

/// Liquid-gas transfer `kLa · (S − f · K_H(T) · p_gas)`; negative when absorbing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasTransfer {
    /// Dissolved form, a component or an equilibrium species such as free CO₂
    pub dissolved: Target,
    /// Gas component id
    pub gas: String,
    /// unit: 1/d
    pub k_la: f64,
    /// unit: kmol/(m^3 bar)
    pub henry: VantHoff,
    /// Liquid concentration units per kmol of gas, e.g. 16 kg COD/kmol for hydrogen
    pub liquid_per_kmol: f64,
}

#[typetag::serde]
impl RateLaw for GasTransfer {
    fn rate(&self, ctx: &RateContext) -> AdmResult<f64> {
        let dissolved = match &self.dissolved {
            Target::Component(id) => ctx.conc.get(id)?,
            Target::Species(name) => ctx.equilibrium.species_concentration(name)?,
        };
        let pressure = ctx
            .partial_pressures
            .get(&self.gas)
            .copied()
            .ok_or_else(|| AdmError::MissingComponent(self.gas.clone()))?;
        let saturation = self.liquid_per_kmol * self.henry.at(ctx.temperature) * pressure;
        Ok(self.k_la * (dissolved - saturation))
    }

    fn components(&self) -> Vec<String> {
        match &self.dissolved {
            Target::Component(id) => vec![id.clone(), self.gas.clone()],
            Target::Species(_) => vec![self.gas.clone()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessClass {
    Biological,
    Chemical,
    /// Negative rates dissolve the mineral
    Precipitation,
    /// Negative rates absorb gas into the liquid
    GasTransfer,
}

impl ProcessClass {
    /// Whether rates of this class may change sign.
    pub fn is_reversible(&self) -> bool {
        matches!(self, ProcessClass::Precipitation | ProcessClass::GasTransfer)
    }
}

/// A quantity conserved by biological and chemical conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conserved {
    Cod,
    Carbon,
    Nitrogen,
    Phosphorus,
}

impl Conserved {
    /// Amount carried per unit concentration of a component.
    pub fn content(&self, component: &Component) -> f64 {
        match self {
            Conserved::Cod => component.cod_factor(),
            Conserved::Carbon => component.content.carbon,
            Conserved::Nitrogen => component.content.nitrogen,
            Conserved::Phosphorus => component.content.phosphorus,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Process {
    pub name: String,
    pub class: ProcessClass,
    pub law: Box<dyn RateLaw>,
    /// Coefficients over liquid components; absent ids are zero
    pub stoichiometry: IndexMap<String, f64>,
}

impl Process {
    pub fn new(name: &str, class: ProcessClass, law: impl RateLaw + 'static) -> Self {
        Self {
            name: name.to_string(),
            class,
            law: Box::new(law),
            stoichiometry: IndexMap::new(),
        }
    }

    /// Add `coefficient` to the stoichiometry of `component`.
    pub fn with(mut self, component: &str, coefficient: f64) -> Self {
        *self
            .stoichiometry
            .entry(component.to_string())
            .or_insert(0.0) += coefficient;
        self
    }

    /// Net amount of a conserved quantity produced per unit rate.
    pub fn balance_residual(
        &self,
        registry: &ComponentRegistry,
        conserved: Conserved,
    ) -> AdmResult<f64> {
        self.stoichiometry
            .iter()
            .try_fold(0.0, |sum, (id, nu)| {
                Ok(sum + nu * conserved.content(registry.get(id)?))
            })
    }

    /// Close the balance of a conserved quantity through `sink`.
    ///
    /// # Errors
    ///
    /// Fails with [`AdmError::InvalidStoichiometry`] if `sink` carries none of it.
    pub fn closed_by(
        mut self,
        registry: &ComponentRegistry,
        sink: &str,
        conserved: Conserved,
    ) -> AdmResult<Self> {
        let content = conserved.content(registry.get(sink)?);
        if content == 0.0 {
            return Err(AdmError::InvalidStoichiometry {
                process: self.name.clone(),
                reason: format!("{} carries no {:?}", sink, conserved),
            });
        }
        let residual = self.balance_residual(registry, conserved)?;
        self = self.with(sink, -residual / content);
        Ok(self)
    }
}

/// Processes together with their stoichiometric matrix.
#[derive(Debug, Serialize, Deserialize)]
pub struct RateTable {
    processes: Vec<Process>,
    layout: Layout,
    /// processes × liquid components
    matrix: Array2<f64>,
}

impl RateTable {
    /// Validate the processes against the registry and build the matrix.
    ///
    /// `layout` fixes the column order and must contain only liquid components.
    pub fn new(
        registry: &ComponentRegistry,
        layout: Layout,
        processes: Vec<Process>,
    ) -> AdmResult<Self> {
        let mut matrix = Array2::zeros((processes.len(), layout.len()));
        let mut names = std::collections::HashSet::new();
        for (row, process) in processes.iter().enumerate() {
            if !names.insert(process.name.as_str()) {
                return Err(AdmError::InvalidConfiguration(format!(
                    "process '{}' is defined twice",
                    process.name
                )));
            }
            for id in process.law.components() {
                registry.get(&id)?;
            }
            for (id, nu) in &process.stoichiometry {
                let component = registry.get(id)?;
                let column = layout
                    .get_index_of(id)
                    .filter(|_| component.phase_class.is_liquid())
                    .ok_or_else(|| AdmError::InvalidStoichiometry {
                        process: process.name.clone(),
                        reason: format!("'{}' is not a liquid state variable", id),
                    })?;
                if !nu.is_finite() {
                    return Err(AdmError::InvalidStoichiometry {
                        process: process.name.clone(),
                        reason: format!("coefficient of '{}' is not finite", id),
                    });
                }
                matrix[[row, column]] = *nu;
            }
        }
        Ok(Self {
            processes,
            layout,
            matrix,
        })
    }

    /// Rate of a single process. Irreversible processes never report a negative rate.
    pub fn rate_of(&self, row: usize, ctx: &RateContext) -> AdmResult<f64> {
        let process = self.processes.get(row).ok_or_else(|| {
            AdmError::InvalidConfiguration(format!("no process in row {}", row))
        })?;
        let value = process.law.rate(ctx)?;
        Ok(if process.class.is_reversible() {
            value
        } else {
            value.max(0.0)
        })
    }

    /// Rate of every process, in process order.
    pub fn evaluate_rates(&self, ctx: &RateContext) -> AdmResult<Array1<f64>> {
        let mut rates = Array1::zeros(self.processes.len());
        for (row, rate) in rates.iter_mut().enumerate() {
            *rate = self.rate_of(row, ctx)?;
        }
        Ok(rates)
    }

    /// Component reaction terms `Nᵀ · rates`, in layout order.
    pub fn reaction_terms(&self, rates: &Array1<f64>) -> Array1<f64> {
        self.matrix.t().dot(rates)
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.processes.iter().position(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ElementalContent, PhaseClass};
    use crate::state::layout;
    use approx::assert_relative_eq;

    fn registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        for c in [
            Component::organic("S_su", PhaseClass::Soluble, 180.16, 192.0 / 180.16)
                .with_content(ElementalContent::new(0.0313, 0.0, 0.0)),
            Component::organic("S_ac", PhaseClass::Soluble, 60.05, 64.0 / 60.05)
                .with_content(ElementalContent::new(0.0313, 0.0, 0.0)),
            Component::organic("X_su", PhaseClass::Particulate, 113.0, 160.0 / 113.0)
                .with_content(ElementalContent::new(0.0313, 0.08 / 14.0, 0.0)),
            Component::ion("S_IC", "C", 12.011, -1)
                .with_content(ElementalContent::new(1.0, 0.0, 0.0)),
            Component::ion("S_IN", "N", 14.007, 1)
                .with_content(ElementalContent::new(0.0, 1.0, 0.0)),
            Component::new(
                "G_ch4",
                PhaseClass::Gas,
                crate::component::MeasuredAs::Cod,
                crate::component::Basis::Mass,
                16.04,
            ),
        ] {
            registry.register(c).unwrap();
        }
        registry
    }

    fn uptake() -> Process {
        Process::new(
            "uptake_sugars",
            ProcessClass::Biological,
            MonodUptake::new("S_su", "X_su", 30.0, 0.5),
        )
        .with("S_su", -1.0)
        .with("X_su", 0.1)
        .with("S_ac", 0.9)
    }

    fn liquid_layout(registry: &ComponentRegistry) -> Layout {
        layout(&registry.liquid_ids())
    }

    #[test]
    fn test_closure_balances_carbon_and_nitrogen() {
        let registry = registry();
        let process = uptake()
            .closed_by(&registry, "S_IC", Conserved::Carbon)
            .unwrap()
            .closed_by(&registry, "S_IN", Conserved::Nitrogen)
            .unwrap();
        for conserved in [Conserved::Carbon, Conserved::Nitrogen, Conserved::Cod] {
            assert_relative_eq!(
                process.balance_residual(&registry, conserved).unwrap(),
                0.0,
                epsilon = 1e-12
            );
        }
        assert_relative_eq!(
            process.stoichiometry["S_IN"],
            -0.1 * 0.08 / 14.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_closure_needs_a_carrier() {
        let registry = registry();
        let err = uptake()
            .closed_by(&registry, "S_ac", Conserved::Nitrogen)
            .unwrap_err();
        assert!(matches!(err, AdmError::InvalidStoichiometry { .. }));
    }

    #[test]
    fn test_unknown_component_rejected_at_construction() {
        let registry = registry();
        let process = uptake().with("S_unknown", 1.0);
        let err = RateTable::new(&registry, liquid_layout(&registry), vec![process]).unwrap_err();
        assert_eq!(err, AdmError::UnknownComponent("S_unknown".to_string()));
    }

    #[test]
    fn test_gas_components_not_allowed_in_liquid_stoichiometry() {
        let registry = registry();
        let process = uptake().with("G_ch4", 1.0);
        let err = RateTable::new(&registry, liquid_layout(&registry), vec![process]).unwrap_err();
        assert!(matches!(err, AdmError::InvalidStoichiometry { .. }));
    }

    #[test]
    fn test_reaction_terms_follow_the_matrix() {
        let registry = registry();
        let table = RateTable::new(&registry, liquid_layout(&registry), vec![uptake()]).unwrap();
        let terms = table.reaction_terms(&Array1::from(vec![2.0]));
        assert_eq!(terms.to_vec(), vec![-2.0, 1.8, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn test_rate_law_round_trips_through_json() {
        let process = uptake();
        let json = serde_json::to_string(&process).unwrap();
        assert!(json.contains("MonodUptake"));
        let back: Process = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "uptake_sugars");
        assert_eq!(back.law.components(), vec!["S_su", "X_su"]);
    }
}
