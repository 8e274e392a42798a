//! Reactor ODE assembly and the integration driver.
//!
//! A [`ReactionModel`] is the configured chemistry (components, processes, acid-base
//! system, minerals and volatiles). A [`Reactor`] binds a model to a vessel
//! configuration and an influent, and evaluates the right-hand side
//!
//! $$ \frac{dc_i}{dt} = \frac{q}{V_{liq}}\left(c_{in,i} - c_i (1 - r_i)\right) + \sum_p \nu_{p,i} \rho_p $$
//!
//! together with the headspace balances. Species declared algebraic (dissolved hydrogen
//! in ADM1) are not integrated; their value solves `dc/dt = 0` inside every evaluation.
//!
//! A [`Simulation`] drives `ode_solvers` over fixed check intervals. Between intervals it
//! clamps negative concentrations, refreshes algebraic species and tests the
//! steady-state criterion.

use crate::activity::{saturation_index, Mineral, SaturationRecord};
use crate::component::{ComponentRegistry, PhaseClass};
use crate::equilibrium::{EquilibriumState, EquilibriumSystem};
use crate::errors::{AdmError, AdmResult};
use crate::gas::{GasPhase, GasSpecies, PressureMode};
use crate::numerics::{expand_upper_bracket, safeguarded_newton, RootSettings};
use crate::process::{Process, RateContext, RateTable};
use crate::state::{ClampEvent, ConcentrationRecord, ConcentrationVector, Layout};
use indexmap::IndexMap;
use nalgebra::DVector;
use ndarray::Array1;
use ode_solvers::{Dopri5, Rk4, System};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convergence guard of the algebraic species solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuasiSteadySettings {
    pub root: RootSettings,
    /// First upper bound tried for the concentration
    pub initial_upper: f64,
    pub expansion_factor: f64,
    pub max_expansions: usize,
}

impl Default for QuasiSteadySettings {
    fn default() -> Self {
        Self {
            root: RootSettings {
                absolute_tolerance: 1e-15,
                relative_tolerance: 1e-9,
                max_iterations: 100,
            },
            initial_upper: 1e-6,
            expansion_factor: 10.0,
            max_expansions: 30,
        }
    }
}

/// The pieces a [`ReactionModel`] is assembled from.
#[derive(Debug)]
pub struct ModelParts {
    pub registry: ComponentRegistry,
    pub processes: Vec<Process>,
    pub equilibrium: EquilibriumSystem,
    pub minerals: Vec<Mineral>,
    pub gas_species: Vec<GasSpecies>,
    /// Liquid components solved algebraically
    pub algebraic: Vec<String>,
    pub quasi_steady: QuasiSteadySettings,
}

/// A validated reaction network.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionModel {
    pub registry: ComponentRegistry,
    pub rate_table: RateTable,
    pub equilibrium: EquilibriumSystem,
    pub minerals: Vec<Mineral>,
    pub gas: GasPhase,
    pub algebraic: Vec<String>,
    pub quasi_steady: QuasiSteadySettings,
}

impl ReactionModel {
    pub fn new(parts: ModelParts) -> AdmResult<Self> {
        let ModelParts {
            registry,
            processes,
            equilibrium,
            minerals,
            gas_species,
            algebraic,
            quasi_steady,
        } = parts;

        let liquid = crate::state::layout(&registry.liquid_ids());
        let rate_table = RateTable::new(&registry, liquid, processes)?;
        let gas = GasPhase::new(&registry, &rate_table, gas_species)?;

        for mineral in &minerals {
            if registry.get(&mineral.component)?.phase_class != PhaseClass::Mineral {
                return Err(AdmError::InvalidConfiguration(format!(
                    "'{}' is not a mineral component",
                    mineral.component
                )));
            }
        }
        for id in &algebraic {
            let component = registry.get(id)?;
            if !component.phase_class.is_liquid()
                || component.charge != 0
                || equilibrium.involves(id)
            {
                return Err(AdmError::InvalidConfiguration(format!(
                    "'{}' cannot be solved algebraically: it must be an uncharged liquid \
                     component outside the acid-base system",
                    id
                )));
            }
        }

        Ok(Self {
            registry,
            rate_table,
            equilibrium,
            minerals,
            gas,
            algebraic,
            quasi_steady,
        })
    }

    pub fn liquid_layout(&self) -> &Layout {
        self.rate_table.layout()
    }

    pub fn gas_layout(&self) -> Layout {
        self.gas.layout()
    }

    /// Saturation record of every mineral.
    pub fn saturation(
        &self,
        equilibrium: &EquilibriumState,
        temperature: f64,
    ) -> AdmResult<IndexMap<String, SaturationRecord>> {
        self.minerals
            .iter()
            .map(|m| Ok((m.component.clone(), saturation_index(m, equilibrium, temperature)?)))
            .collect()
    }

    /// Serialise the whole network, including rate laws.
    pub fn to_json(&self) -> AdmResult<String> {
        serde_json::to_string(self).map_err(|e| AdmError::Parse {
            format: "JSON".to_string(),
            details: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> AdmResult<Self> {
        serde_json::from_str(json).map_err(|e| AdmError::Parse {
            format: "JSON".to_string(),
            details: e.to_string(),
        })
    }
}

/// Vessel and operating conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// unit: m^3
    pub liquid_volume: f64,
    /// unit: m^3
    pub gas_volume: f64,
    /// unit: m^3/d
    pub flow: f64,
    /// unit: K
    pub temperature: f64,
    pub pressure_mode: PressureMode,
    /// Fraction of each component retained in the vessel; absent ids are zero
    pub retention: IndexMap<String, f64>,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            liquid_volume: 3400.0,
            gas_volume: 300.0,
            flow: 170.0,
            temperature: 308.15,
            pressure_mode: PressureMode::default(),
            retention: IndexMap::new(),
        }
    }
}

impl ReactorConfig {
    /// Hydraulic retention time
    /// unit: d
    pub fn hydraulic_retention_time(&self) -> f64 {
        self.liquid_volume / self.flow
    }

    fn validate(&self) -> AdmResult<()> {
        let positive = [
            ("liquid_volume", self.liquid_volume),
            ("gas_volume", self.gas_volume),
            ("temperature", self.temperature),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(AdmError::InvalidConfiguration(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.flow >= 0.0) {
            return Err(AdmError::InvalidConfiguration(format!(
                "flow must be non-negative, got {}",
                self.flow
            )));
        }
        for (id, fraction) in &self.retention {
            if !(0.0..=1.0).contains(fraction) {
                return Err(AdmError::InvalidConfiguration(format!(
                    "retention fraction of '{}' must lie in [0, 1], got {}",
                    id, fraction
                )));
            }
        }
        Ok(())
    }
}

/// The integrated state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactorState {
    /// unit: d
    pub time: f64,
    pub liquid: ConcentrationVector,
    pub gas: ConcentrationVector,
    /// unit: m^3/d
    pub flow: f64,
    /// unit: K
    pub temperature: f64,
    /// Retained fraction per liquid component, in layout order
    pub retention: Vec<f64>,
}

impl ReactorState {
    /// Split a single record holding liquid and gas ids into a reactor state.
    pub fn from_record(
        model: &ReactionModel,
        config: &ReactorConfig,
        record: &ConcentrationRecord,
    ) -> AdmResult<Self> {
        let gas_layout = model.gas_layout();
        let (gas_record, liquid_record): (ConcentrationRecord, ConcentrationRecord) = record
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .partition(|(id, _)| gas_layout.contains(id));
        Ok(Self {
            time: 0.0,
            liquid: ConcentrationVector::from_record(
                model.liquid_layout().clone(),
                &liquid_record,
            )?,
            gas: ConcentrationVector::from_record(gas_layout, &gas_record)?,
            flow: config.flow,
            temperature: config.temperature,
            retention: retention_vector(model, config)?,
        })
    }

    fn to_vector(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.liquid.len() + self.gas.len(),
            self.liquid
                .values()
                .iter()
                .chain(self.gas.values())
                .copied(),
        )
    }
}

fn retention_vector(model: &ReactionModel, config: &ReactorConfig) -> AdmResult<Vec<f64>> {
    let layout = model.liquid_layout();
    let mut retention = vec![0.0; layout.len()];
    for (id, fraction) in &config.retention {
        let index = layout
            .get_index_of(id)
            .ok_or_else(|| AdmError::UnknownComponent(id.clone()))?;
        retention[index] = *fraction;
    }
    Ok(retention)
}

/// Derived quantities that rate laws read, fixed for one evaluation.
#[derive(Debug, Clone)]
pub struct Environment {
    pub temperature: f64,
    pub equilibrium: EquilibriumState,
    pub saturation: IndexMap<String, SaturationRecord>,
    pub partial_pressures: IndexMap<String, f64>,
}

impl Environment {
    pub fn context<'a>(&'a self, conc: &'a ConcentrationVector) -> RateContext<'a> {
        RateContext {
            conc,
            temperature: self.temperature,
            equilibrium: &self.equilibrium,
            saturation: &self.saturation,
            partial_pressures: &self.partial_pressures,
        }
    }
}

/// One right-hand-side evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Liquid concentrations used for the rates, algebraic species solved
    pub liquid: ConcentrationVector,
    pub liquid_derivative: Vec<f64>,
    pub gas_derivative: Vec<f64>,
    pub rates: Array1<f64>,
    /// unit: m^3/d
    pub gas_flow: f64,
    pub environment: Environment,
}

/// A reaction model bound to a vessel and an influent.
#[derive(Debug)]
pub struct Reactor<'m> {
    model: &'m ReactionModel,
    config: ReactorConfig,
    influent: ConcentrationVector,
    retention: Vec<f64>,
    algebraic_columns: Vec<usize>,
}

impl<'m> Reactor<'m> {
    pub fn new(
        model: &'m ReactionModel,
        config: ReactorConfig,
        influent: ConcentrationVector,
    ) -> AdmResult<Self> {
        config.validate()?;
        if influent.layout() != model.liquid_layout() {
            return Err(AdmError::InvalidConfiguration(
                "influent must cover the liquid components in registry order".to_string(),
            ));
        }
        let retention = retention_vector(model, &config)?;
        let algebraic_columns = model
            .algebraic
            .iter()
            .map(|id| {
                model
                    .liquid_layout()
                    .get_index_of(id)
                    .ok_or_else(|| AdmError::UnknownComponent(id.clone()))
            })
            .collect::<AdmResult<Vec<_>>>()?;
        Ok(Self {
            model,
            config,
            influent,
            retention,
            algebraic_columns,
        })
    }

    pub fn model(&self) -> &ReactionModel {
        self.model
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    pub fn influent(&self) -> &ConcentrationVector {
        &self.influent
    }

    pub fn retention(&self) -> &[f64] {
        &self.retention
    }

    /// Flow-through term of a liquid component.
    fn transport(&self, column: usize, value: f64) -> f64 {
        let q = self.config.flow / self.config.liquid_volume;
        q * (self.influent.values()[column] - value * (1.0 - self.retention[column]))
    }

    /// Equilibrium, saturation and partial pressures for a liquid/gas pair.
    pub fn environment(&self, conc: &ConcentrationVector, gas: &[f64]) -> AdmResult<Environment> {
        let temperature = self.config.temperature;
        let equilibrium = self.model.equilibrium.solve(conc, temperature)?;
        let saturation = self.model.saturation(&equilibrium, temperature)?;
        let partial_pressures = self.model.gas.pressure_map(gas, temperature)?;
        Ok(Environment {
            temperature,
            equilibrium,
            saturation,
            partial_pressures,
        })
    }

    /// Net production of component `column` with every other concentration held fixed.
    fn algebraic_residual(
        &self,
        column: usize,
        conc: &ConcentrationVector,
        environment: &Environment,
    ) -> AdmResult<f64> {
        let table = &self.model.rate_table;
        let matrix = table.matrix();
        let ctx = environment.context(conc);
        let mut net = self.transport(column, conc.values()[column]);
        for row in 0..table.len() {
            let nu = matrix[[row, column]];
            if nu != 0.0 {
                net += nu * table.rate_of(row, &ctx)?;
            }
        }
        Ok(net)
    }

    /// Concentration of an algebraic species at which its derivative vanishes.
    ///
    /// Solved by a bracketed Newton iteration with a finite-difference slope; the
    /// bracket starts at zero and is widened geometrically. A species with no net
    /// production at zero concentration stays at zero.
    pub fn solve_quasi_steady(
        &self,
        id: &str,
        conc: &ConcentrationVector,
        environment: &Environment,
    ) -> AdmResult<f64> {
        let column = conc
            .index_of(id)
            .ok_or_else(|| AdmError::MissingComponent(id.to_string()))?;
        let settings = &self.model.quasi_steady;
        let solver = format!("quasi-steady solve of {}", id);

        let trial = RefCell::new(conc.clone());
        let failure: RefCell<Option<AdmError>> = RefCell::new(None);
        let residual = |s: f64| -> f64 {
            let mut trial = trial.borrow_mut();
            trial.values_mut()[column] = s;
            match self.algebraic_residual(column, &trial, environment) {
                Ok(value) => value,
                Err(e) => {
                    *failure.borrow_mut() = Some(e);
                    f64::NAN
                }
            }
        };
        let surface = |e: crate::numerics::RootFailure| {
            failure
                .borrow_mut()
                .take()
                .unwrap_or_else(|| AdmError::nonconvergence(solver.clone(), e.to_string()))
        };

        let at_zero = residual(0.0);
        if let Some(e) = failure.borrow_mut().take() {
            return Err(e);
        }
        if at_zero <= 0.0 {
            return Ok(0.0);
        }

        let current = conc.values()[column].max(0.0);
        let start = settings.initial_upper.max(2.0 * current);
        let upper = expand_upper_bracket(
            residual,
            0.0,
            start,
            settings.expansion_factor,
            settings.max_expansions,
        )
        .map_err(surface)?;

        let with_slope = |s: f64| {
            let step = (s.abs() * 1e-6).max(1e-16);
            let g = residual(s);
            (g, (residual(s + step) - g) / step)
        };
        let guess = (current > 0.0).then_some(current);
        let root =
            safeguarded_newton(with_slope, 0.0, upper, guess, &settings.root).map_err(surface)?;
        Ok(root.x)
    }

    /// Evaluate the full right-hand side.
    ///
    /// Negative inputs are read as zero; the state itself is only clamped at check
    /// interval boundaries.
    pub fn evaluate(&self, liquid: &ConcentrationVector, gas: &[f64]) -> AdmResult<Evaluation> {
        let mut conc = liquid.non_negative();
        let environment = self.environment(&conc, gas)?;

        for (id, &column) in self.model.algebraic.iter().zip(&self.algebraic_columns) {
            let value = self.solve_quasi_steady(id, &conc, &environment)?;
            conc.values_mut()[column] = value;
        }

        let rates = self
            .model
            .rate_table
            .evaluate_rates(&environment.context(&conc))?;
        let reaction = self.model.rate_table.reaction_terms(&rates);

        let mut liquid_derivative: Vec<f64> = conc
            .values()
            .iter()
            .enumerate()
            .map(|(i, c)| self.transport(i, *c) + reaction[i])
            .collect();
        for &column in &self.algebraic_columns {
            liquid_derivative[column] = 0.0;
        }

        let gas_phase = &self.model.gas;
        let gas_conc: Vec<f64> = gas.iter().map(|c| c.max(0.0)).collect();
        let transfer = gas_phase.transfer_rates(&rates);
        let gas_flow = gas_phase.compute_gas_flow(
            &transfer,
            &gas_conc,
            self.config.temperature,
            self.config.liquid_volume,
            &self.config.pressure_mode,
        )?;
        let gas_derivative = gas_phase.gas_phase_derivative(
            &transfer,
            &gas_conc,
            gas_flow,
            self.config.liquid_volume,
            self.config.gas_volume,
        )?;

        Ok(Evaluation {
            liquid: conc,
            liquid_derivative,
            gas_derivative,
            rates,
            gas_flow,
            environment,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum IntegratorSettings {
    /// Fixed-step fourth-order Runge-Kutta
    Rk4 {
        /// unit: d
        step: f64,
    },
    /// Adaptive Dormand-Prince 5(4)
    Dopri5 { rtol: f64, atol: f64 },
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        IntegratorSettings::Dopri5 {
            rtol: 1e-6,
            atol: 1e-8,
        }
    }
}

/// When a run counts as converged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteadyStateCriterion {
    /// Bound on the change over one check interval,
    /// `max |y(t) - y(t - dt)| / (dt * max(|y|, floor))`
    /// unit: 1/d
    pub relative_tolerance: f64,
    pub absolute_floor: f64,
    /// How long the bound must hold
    /// unit: d
    pub window: f64,
    /// unit: d
    pub check_interval: f64,
    /// unit: d
    pub max_time: f64,
}

impl Default for SteadyStateCriterion {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-3,
            absolute_floor: 1e-6,
            window: 5.0,
            check_interval: 1.0,
            max_time: 200.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub integrator: IntegratorSettings,
    pub steady_state: SteadyStateCriterion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Initializing,
    Integrating,
    Converged,
    Failed { error: AdmError },
    /// The time budget ran out before the steady-state criterion held
    MaxTimeReached,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Initializing | RunStatus::Integrating)
    }
}

/// Progress recorded at every check interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    /// unit: d
    pub time: f64,
    /// Steady-state metric at the end of the interval
    pub metric: f64,
    pub ph: f64,
    /// unit: m^3/d
    pub gas_flow: f64,
}

/// Result of a finished run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub state: ReactorState,
    /// unit: s
    pub wall_clock: f64,
    pub clamp_events: Vec<ClampEvent>,
    pub history: Vec<WindowRecord>,
    /// Lowest liquid concentrations seen, from the initial state and every check interval
    pub minimum: ConcentrationVector,
}

/// `max_i |y_i - y'_i| / (dt * max(|y_i|, floor))` between the states `y'` and `y`
/// at either end of a check interval of length `dt`.
///
/// The derivative of a stiff headspace entry stays at the integrator's error level
/// once settled, so the change across the interval is used instead.
pub fn steady_state_metric(previous: &[f64], current: &[f64], interval: f64, floor: f64) -> f64 {
    previous
        .iter()
        .zip(current)
        .map(|(y0, y)| (y - y0).abs() / (interval * y.abs().max(floor)))
        .fold(0.0, f64::max)
}

/// Adapter exposing a reactor to `ode_solvers`.
struct OdeProblem<'r, 'm> {
    reactor: &'r Reactor<'m>,
    n_liquid: usize,
    failure: &'r RefCell<Option<AdmError>>,
    /// Ids of the liquid then gas entries of the state vector
    ids: &'r [String],
    /// Entries seen negative at the previous accepted step
    negative: Vec<bool>,
    clamps: &'r RefCell<Vec<ClampEvent>>,
}

impl System<f64, DVector<f64>> for OdeProblem<'_, '_> {
    fn system(&self, _t: f64, y: &DVector<f64>, dy: &mut DVector<f64>) {
        if self.failure.borrow().is_some() {
            dy.fill(0.0);
            return;
        }
        let layout = self.reactor.model.liquid_layout().clone();
        let liquid = y.rows(0, self.n_liquid).iter().copied().collect();
        let gas: Vec<f64> = y.rows(self.n_liquid, y.len() - self.n_liquid).iter().copied().collect();
        let evaluation = ConcentrationVector::from_values(layout, liquid)
            .and_then(|liquid| self.reactor.evaluate(&liquid, &gas));
        match evaluation {
            Ok(evaluation) => {
                for (i, d) in evaluation
                    .liquid_derivative
                    .iter()
                    .chain(&evaluation.gas_derivative)
                    .enumerate()
                {
                    dy[i] = *d;
                }
            }
            Err(e) => {
                *self.failure.borrow_mut() = Some(e);
                dy.fill(0.0);
            }
        }
    }

    /// Records every entry that turns negative at an accepted step. Rates already
    /// read such entries as zero; the stored value is reset at the end of the interval.
    fn solout(&mut self, t: f64, y: &DVector<f64>, _dy: &DVector<f64>) -> bool {
        for ((value, id), was_negative) in y.iter().zip(self.ids).zip(self.negative.iter_mut()) {
            let negative = *value < 0.0;
            if negative && !*was_negative {
                warn!(component = %id, value = *value, time = t, "Concentration went negative");
                self.clamps.borrow_mut().push(ClampEvent {
                    component: id.clone(),
                    value: *value,
                    time: t,
                });
            }
            *was_negative = negative;
        }
        self.failure.borrow().is_some() || y.iter().any(|v| !v.is_finite())
    }
}

/// A run of a reactor from an initial state towards steady state.
#[derive(Debug)]
pub struct Simulation<'r, 'm> {
    reactor: &'r Reactor<'m>,
    settings: SimulationSettings,
    state: ReactorState,
    status: RunStatus,
    steady_windows: usize,
    clamp_events: Vec<ClampEvent>,
    history: Vec<WindowRecord>,
    minimum: ConcentrationVector,
    started: Instant,
}

impl<'r, 'm> Simulation<'r, 'm> {
    /// Validate the initial state and enter `Integrating`.
    ///
    /// An invalid initial state leaves the run `Failed` without integrating.
    pub fn new(reactor: &'r Reactor<'m>, initial: ReactorState, settings: SimulationSettings) -> Self {
        let minimum = initial.liquid.clone();
        let mut simulation = Self {
            reactor,
            settings,
            state: initial,
            status: RunStatus::Initializing,
            steady_windows: 0,
            clamp_events: Vec::new(),
            history: Vec::new(),
            minimum,
            started: Instant::now(),
        };
        match simulation.initialise() {
            Ok(()) => {
                info!(
                    liquid = simulation.state.liquid.len(),
                    gas = simulation.state.gas.len(),
                    max_time = settings.steady_state.max_time,
                    "Starting reactor run"
                );
                simulation.status = RunStatus::Integrating;
            }
            Err(error) => {
                warn!(%error, "Initial state rejected");
                simulation.status = RunStatus::Failed { error };
            }
        }
        simulation
    }

    fn initialise(&mut self) -> AdmResult<()> {
        let model = self.reactor.model;
        if self.state.liquid.layout() != model.liquid_layout()
            || self.state.gas.layout() != &model.gas_layout()
        {
            return Err(AdmError::InvalidConfiguration(
                "initial state does not match the model layout".to_string(),
            ));
        }
        let invalid = self
            .state
            .liquid
            .iter()
            .chain(self.state.gas.iter())
            .find(|(_, v)| !v.is_finite() || *v < 0.0);
        if let Some((id, value)) = invalid {
            return Err(AdmError::InvalidConfiguration(format!(
                "initial concentration of '{}' is {}",
                id, value
            )));
        }
        let criterion = &self.settings.steady_state;
        if !(criterion.check_interval > 0.0) || !(criterion.max_time > 0.0) {
            return Err(AdmError::InvalidConfiguration(
                "check interval and maximum time must be positive".to_string(),
            ));
        }
        self.state.flow = self.reactor.config.flow;
        self.state.temperature = self.reactor.config.temperature;
        self.state.retention = self.reactor.retention.clone();
        // Start from consistent algebraic species
        let evaluation = self.reactor.evaluate(&self.state.liquid, self.state.gas.values())?;
        self.adopt_algebraic(&evaluation)?;
        Ok(())
    }

    fn adopt_algebraic(&mut self, evaluation: &Evaluation) -> AdmResult<()> {
        for id in &self.reactor.model.algebraic {
            self.state.liquid.set(id, evaluation.liquid.get(id)?)?;
        }
        Ok(())
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn state(&self) -> &ReactorState {
        &self.state
    }

    pub fn history(&self) -> &[WindowRecord] {
        &self.history
    }

    /// Integrate to `t_end`, returning the final state vector and the entries that
    /// went negative at intermediate steps.
    fn integrate(&self, t_end: f64) -> AdmResult<(DVector<f64>, Vec<ClampEvent>)> {
        let t0 = self.state.time;
        let y0 = self.state.to_vector();
        let ids: Vec<String> = self
            .state
            .liquid
            .layout()
            .iter()
            .chain(self.state.gas.layout().iter())
            .cloned()
            .collect();
        let failure = RefCell::new(None);
        let clamps = RefCell::new(Vec::new());
        let problem = OdeProblem {
            reactor: self.reactor,
            n_liquid: self.state.liquid.len(),
            failure: &failure,
            negative: vec![false; ids.len()],
            ids: &ids,
            clamps: &clamps,
        };
        let divergence = |reason: String| AdmError::IntegratorDivergence { time: t0, reason };

        let last = match self.settings.integrator {
            IntegratorSettings::Rk4 { step } => {
                let mut solver = Rk4::new(problem, t0, y0, t_end, step);
                solver
                    .integrate()
                    .map_err(|e| divergence(format!("{:?}", e)))?;
                solver.y_out().last().cloned()
            }
            IntegratorSettings::Dopri5 { rtol, atol } => {
                let mut solver = Dopri5::new(problem, t0, t_end, t_end - t0, y0, rtol, atol);
                solver
                    .integrate()
                    .map_err(|e| divergence(format!("{:?}", e)))?;
                solver.y_out().last().cloned()
            }
        };
        if let Some(e) = failure.into_inner() {
            return Err(e);
        }
        let y = last.ok_or_else(|| divergence("integrator produced no output".to_string()))?;
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(AdmError::IntegratorDivergence {
                time: t_end,
                reason: format!("state entry {} is not finite", i),
            });
        }
        Ok((y, clamps.into_inner()))
    }

    /// Advance by one check interval. Terminal runs are left unchanged.
    pub fn step_window(&mut self) -> &RunStatus {
        if self.status.is_terminal() {
            return &self.status;
        }
        if let Err(error) = self.try_step_window() {
            warn!(time = self.state.time, %error, "Reactor run failed");
            self.status = RunStatus::Failed { error };
        }
        &self.status
    }

    fn try_step_window(&mut self) -> AdmResult<()> {
        let criterion = self.settings.steady_state;
        let t_start = self.state.time;
        let t_end = (t_start + criterion.check_interval).min(criterion.max_time);
        let previous: Vec<f64> = self
            .state
            .liquid
            .values()
            .iter()
            .chain(self.state.gas.values())
            .copied()
            .collect();
        let (y, step_clamps) = self.integrate(t_end)?;
        self.clamp_events.extend(step_clamps);

        let n_liquid = self.state.liquid.len();
        self.state
            .liquid
            .values_mut()
            .copy_from_slice(&y.as_slice()[..n_liquid]);
        self.state
            .gas
            .values_mut()
            .copy_from_slice(&y.as_slice()[n_liquid..]);
        self.state.time = t_end;
        self.clamp_events
            .extend(self.state.liquid.clamp_negative(t_end));
        self.clamp_events.extend(self.state.gas.clamp_negative(t_end));

        let evaluation = self
            .reactor
            .evaluate(&self.state.liquid, self.state.gas.values())?;
        self.adopt_algebraic(&evaluation)?;
        for (low, value) in self
            .minimum
            .values_mut()
            .iter_mut()
            .zip(self.state.liquid.values())
        {
            *low = low.min(*value);
        }

        let values: Vec<f64> = self
            .state
            .liquid
            .values()
            .iter()
            .chain(self.state.gas.values())
            .copied()
            .collect();
        let metric = steady_state_metric(
            &previous,
            &values,
            t_end - t_start,
            criterion.absolute_floor,
        );
        self.history.push(WindowRecord {
            time: t_end,
            metric,
            ph: evaluation.environment.equilibrium.ph,
            gas_flow: evaluation.gas_flow,
        });
        debug!(
            time = t_end,
            metric,
            ph = evaluation.environment.equilibrium.ph,
            "Check interval complete"
        );

        if metric < criterion.relative_tolerance {
            self.steady_windows += 1;
        } else {
            self.steady_windows = 0;
        }
        let sustained = self.steady_windows as f64 * criterion.check_interval;
        if sustained >= criterion.window - 1e-9 {
            self.status = RunStatus::Converged;
        } else if t_end >= criterion.max_time {
            self.status = RunStatus::MaxTimeReached;
        }
        Ok(())
    }

    /// Integrate until a terminal status.
    pub fn run(mut self) -> RunOutcome {
        while !self.status.is_terminal() {
            self.step_window();
        }
        let wall_clock = self.started.elapsed().as_secs_f64();
        info!(
            status = ?self.status,
            time = self.state.time,
            wall_clock,
            clamps = self.clamp_events.len(),
            "Reactor run finished"
        );
        RunOutcome {
            status: self.status,
            state: self.state,
            wall_clock,
            clamp_events: self.clamp_events,
            history: self.history,
            minimum: self.minimum,
        }
    }
}
