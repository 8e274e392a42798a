//! Input records supplied by a host and the summaries produced after a run.
//!
//! Records are plain `serde` structs read from TOML or JSON strings; file handling is
//! left to the caller.

use crate::diagnostics::{DiagnosticSettings, Diagnostics};
use crate::errors::{AdmError, AdmResult};
use crate::gas::{water_vapour_pressure, PressureMode};
use crate::process::Conserved;
use crate::reactor::{ReactionModel, Reactor, ReactorConfig, RunOutcome, RunStatus};
use crate::state::{ConcentrationRecord, ConcentrationVector};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Headspace volume per unit liquid volume when no gas volume is given
pub const DEFAULT_GAS_FRACTION: f64 = 300.0 / 3400.0;

pub fn from_toml_str<T: DeserializeOwned>(text: &str) -> AdmResult<T> {
    toml::from_str(text).map_err(|e| AdmError::Parse {
        format: "TOML".to_string(),
        details: e.to_string(),
    })
}

pub fn from_json_str<T: DeserializeOwned>(text: &str) -> AdmResult<T> {
    serde_json::from_str(text).map_err(|e| AdmError::Parse {
        format: "JSON".to_string(),
        details: e.to_string(),
    })
}

/// Operating targets of the digester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisOfDesign {
    /// unit: m^3/d
    pub flow: f64,
    /// unit: K
    pub temperature: f64,
    /// Target hydraulic retention time
    /// unit: d
    pub retention_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sizing {
    /// Defaults to `flow × retention_time`
    /// unit: m^3
    pub liquid_volume: Option<f64>,
    /// Defaults to [`DEFAULT_GAS_FRACTION`] of the liquid volume
    /// unit: m^3
    pub gas_volume: Option<f64>,
    pub retention: IndexMap<String, f64>,
    pub pressure_mode: PressureMode,
}

impl Sizing {
    pub fn reactor_config(&self, basis: &BasisOfDesign) -> AdmResult<ReactorConfig> {
        let liquid_volume = match self.liquid_volume {
            Some(v) => v,
            None if basis.retention_time > 0.0 => basis.flow * basis.retention_time,
            None => {
                return Err(AdmError::InvalidConfiguration(
                    "either a liquid volume or a positive retention time is required".to_string(),
                ))
            }
        };
        Ok(ReactorConfig {
            liquid_volume,
            gas_volume: self
                .gas_volume
                .unwrap_or(liquid_volume * DEFAULT_GAS_FRACTION),
            flow: basis.flow,
            temperature: basis.temperature,
            pressure_mode: self.pressure_mode,
            retention: self.retention.clone(),
        })
    }
}

/// Everything a host supplies for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigesterRecord {
    pub basis: BasisOfDesign,
    #[serde(default)]
    pub sizing: Sizing,
    pub influent: ConcentrationRecord,
    /// Initial liquid and gas concentrations
    pub initial: ConcentrationRecord,
}

impl DigesterRecord {
    pub fn reactor<'m>(&self, model: &'m ReactionModel) -> AdmResult<Reactor<'m>> {
        let config = self.sizing.reactor_config(&self.basis)?;
        let influent =
            ConcentrationVector::from_record(model.liquid_layout().clone(), &self.influent)?;
        Reactor::new(model, config, influent)
    }
}

/// A liquid stream entering or leaving the vessel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    /// unit: m^3/d
    pub flow: f64,
    pub ph: f64,
    /// unit: kg COD/m^3
    pub total_cod: f64,
    pub concentrations: IndexMap<String, f64>,
}

impl StreamSummary {
    pub fn new(
        model: &ReactionModel,
        conc: &ConcentrationVector,
        flow: f64,
        temperature: f64,
    ) -> AdmResult<Self> {
        let ph = model.equilibrium.solve_ph(&conc.non_negative(), temperature)?;
        let mut total_cod = 0.0;
        for (id, c) in conc.iter() {
            total_cod += c * Conserved::Cod.content(model.registry.get(id)?);
        }
        Ok(Self {
            flow,
            ph,
            total_cod,
            concentrations: conc.to_map(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasComposition {
    /// unit: bar
    pub partial_pressure: f64,
    /// Share of the dry gas
    /// unit: %
    pub volume_percent: f64,
    /// unit: ppm
    pub ppm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSummary {
    /// unit: m^3/d
    pub flow: f64,
    /// Including water vapour
    /// unit: bar
    pub total_pressure: f64,
    pub species: IndexMap<String, GasComposition>,
}

impl GasSummary {
    pub fn new(
        model: &ReactionModel,
        gas: &[f64],
        flow: f64,
        temperature: f64,
    ) -> AdmResult<Self> {
        let pressures = model.gas.pressure_map(gas, temperature)?;
        let dry: f64 = pressures.values().sum();
        let species = pressures
            .into_iter()
            .map(|(id, p)| {
                let share = if dry > 0.0 { p / dry } else { 0.0 };
                (
                    id,
                    GasComposition {
                        partial_pressure: p,
                        volume_percent: 100.0 * share,
                        ppm: 1e6 * share,
                    },
                )
            })
            .collect();
        Ok(Self {
            flow,
            total_pressure: dry + water_vapour_pressure(temperature),
            species,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConvergenceStatus {
    Completed,
    Failed,
    MaxTimeReached,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    pub status: ConvergenceStatus,
    /// unit: d
    pub simulated_time: f64,
    /// unit: s
    pub wall_clock: f64,
    pub clamp_events: usize,
    pub message: Option<String>,
}

impl ConvergenceRecord {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let (status, message) = match &outcome.status {
            RunStatus::Converged => (ConvergenceStatus::Completed, None),
            RunStatus::MaxTimeReached => (ConvergenceStatus::MaxTimeReached, None),
            RunStatus::Failed { error } => (ConvergenceStatus::Failed, Some(error.to_string())),
            RunStatus::Initializing | RunStatus::Integrating => (
                ConvergenceStatus::Failed,
                Some("run was abandoned before a terminal state".to_string()),
            ),
        };
        Self {
            status,
            simulated_time: outcome.state.time,
            wall_clock: outcome.wall_clock,
            clamp_events: outcome.clamp_events.len(),
            message,
        }
    }
}

/// Everything reported after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub influent: StreamSummary,
    pub effluent: StreamSummary,
    pub gas: GasSummary,
    pub convergence: ConvergenceRecord,
    pub diagnostics: Diagnostics,
}

impl RunReport {
    /// Summarise the final state of a run.
    ///
    /// Fails only if the final state itself cannot be evaluated.
    pub fn new(
        reactor: &Reactor,
        outcome: &RunOutcome,
        settings: &DiagnosticSettings,
    ) -> AdmResult<Self> {
        let model = reactor.model();
        let config = reactor.config();
        let state = &outcome.state;
        let evaluation = reactor.evaluate(&state.liquid, state.gas.values())?;
        let effluent_flow = config.flow;
        let mut diagnostics =
            Diagnostics::from_evaluation(reactor, &evaluation, state.gas.values(), settings)?;
        diagnostics.include_run_history(&outcome.minimum, settings);
        Ok(Self {
            influent: StreamSummary::new(
                model,
                reactor.influent(),
                config.flow,
                config.temperature,
            )?,
            effluent: StreamSummary::new(
                model,
                &evaluation.liquid,
                effluent_flow,
                config.temperature,
            )?,
            gas: GasSummary::new(
                model,
                state.gas.values(),
                evaluation.gas_flow,
                config.temperature,
            )?,
            convergence: ConvergenceRecord::from_outcome(outcome),
            diagnostics,
        })
    }

    pub fn to_json(&self) -> AdmResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AdmError::Parse {
            format: "JSON".to_string(),
            details: e.to_string(),
        })
    }
}
