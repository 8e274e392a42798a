//! Per-evaluation diagnostics: inhibition breakdown, mineral saturation, the
//! nitrogen-buffer flag and a COD balance over the vessel.

use crate::errors::AdmResult;
use crate::inhibition::combined;
use crate::process::{Conserved, ProcessClass};
use crate::reactor::{Evaluation, Reactor};
use crate::state::ConcentrationVector;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticSettings {
    /// Component holding inorganic nitrogen
    pub nitrogen_component: String,
    /// unit: kmol N/m^3
    pub nitrogen_floor: f64,
    /// A nitrogen limitation factor below this flags the buffer as limiting
    pub limitation_threshold: f64,
    /// Volatile fatty acids the ammonium buffer has to neutralise
    pub acid_components: Vec<String>,
    /// pH below which the vessel counts as acidified
    pub acidified_ph: f64,
    /// In an acidified vessel, inorganic nitrogen below this multiple of the acid
    /// load (kmol/kmol) flags the buffer as limiting
    pub buffer_ratio: f64,
}

impl Default for DiagnosticSettings {
    fn default() -> Self {
        Self {
            nitrogen_component: "S_IN".to_string(),
            nitrogen_floor: 1e-3,
            limitation_threshold: 0.5,
            acid_components: ["S_va", "S_bu", "S_pro", "S_ac"]
                .iter()
                .map(|id| id.to_string())
                .collect(),
            acidified_ph: 6.5,
            buffer_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInhibition {
    /// Product of all factors
    pub total: f64,
    pub factors: IndexMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MineralDiagnostic {
    pub saturation_index: f64,
    /// unit: kg/(m^3 d)
    pub rate: f64,
}

/// COD flows through the vessel.
///
/// unit: kg COD/d
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodBalance {
    pub influent: f64,
    pub effluent: f64,
    pub gas: f64,
    /// Rate of change of the COD held in liquid and headspace
    pub accumulation: f64,
    /// `influent − effluent − gas − accumulation`
    pub residual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub ph: f64,
    /// unit: kmol N/m^3
    pub free_ammonia: f64,
    /// unit: kmol C/m^3
    pub dissolved_co2: f64,
    pub ionic_strength: f64,
    /// Factor breakdown per biological process
    pub inhibition: IndexMap<String, ProcessInhibition>,
    /// Most severe value of each factor label across processes
    pub inhibition_groups: IndexMap<String, f64>,
    pub minerals: IndexMap<String, MineralDiagnostic>,
    pub nitrogen_buffer_limited: bool,
    pub cod_balance: CodBalance,
}

impl Diagnostics {
    pub fn from_evaluation(
        reactor: &Reactor,
        evaluation: &Evaluation,
        gas: &[f64],
        settings: &DiagnosticSettings,
    ) -> AdmResult<Self> {
        let model = reactor.model();
        let equilibrium = &evaluation.environment.equilibrium;
        let conc = &evaluation.liquid;

        let mut inhibition = IndexMap::new();
        let mut inhibition_groups: IndexMap<String, f64> = IndexMap::new();
        for process in model.rate_table.processes() {
            let terms = process.law.inhibitions();
            if terms.is_empty() {
                continue;
            }
            let (total, breakdown) = combined(terms, conc, equilibrium)?;
            for (label, factor) in &breakdown {
                let group = inhibition_groups.entry(label.clone()).or_insert(1.0);
                *group = group.min(*factor);
            }
            inhibition.insert(
                process.name.clone(),
                ProcessInhibition {
                    total,
                    factors: breakdown.into_iter().collect(),
                },
            );
        }

        let mut minerals = IndexMap::new();
        for (row, process) in model.rate_table.processes().iter().enumerate() {
            if process.class != ProcessClass::Precipitation {
                continue;
            }
            for id in process.law.components() {
                if let Some(record) = evaluation.environment.saturation.get(&id) {
                    minerals.insert(
                        id,
                        MineralDiagnostic {
                            saturation_index: record.saturation_index,
                            rate: evaluation.rates[row],
                        },
                    );
                }
            }
        }

        let registry = &model.registry;
        let molar = |id: &str| -> Option<f64> {
            let component = registry.get(id).ok()?;
            Some(conc.get(id).ok()? * component.molar_factor())
        };
        let nitrogen = molar(settings.nitrogen_component.as_str());
        let acid_load: f64 = settings
            .acid_components
            .iter()
            .filter_map(|id| molar(id.as_str()))
            .sum();
        let limitation_label = format!("limitation:{}", settings.nitrogen_component);
        let nitrogen_buffer_limited = nitrogen.map_or(false, |n| n < settings.nitrogen_floor)
            || inhibition_groups
                .get(&limitation_label)
                .map_or(false, |f| *f < settings.limitation_threshold)
            || (equilibrium.ph < settings.acidified_ph
                && nitrogen.map_or(false, |n| n < settings.buffer_ratio * acid_load));

        Ok(Self {
            ph: equilibrium.ph,
            free_ammonia: equilibrium.free_ammonia,
            dissolved_co2: equilibrium.dissolved_co2,
            ionic_strength: equilibrium.ionic_strength,
            inhibition,
            inhibition_groups,
            minerals,
            nitrogen_buffer_limited,
            cod_balance: cod_balance(reactor, evaluation, gas)?,
        })
    }

    /// Also flag an acidified vessel whose inorganic nitrogen fell below the floor at
    /// any point of the run, even if ammonium has since been released again.
    pub fn include_run_history(
        &mut self,
        minimum: &ConcentrationVector,
        settings: &DiagnosticSettings,
    ) {
        let depleted = minimum
            .get(&settings.nitrogen_component)
            .map_or(false, |n| n < settings.nitrogen_floor);
        if depleted && self.ph < settings.acidified_ph {
            self.nitrogen_buffer_limited = true;
        }
    }
}

/// COD entering, leaving and accumulating in the vessel at one evaluation.
pub fn cod_balance(reactor: &Reactor, evaluation: &Evaluation, gas: &[f64]) -> AdmResult<CodBalance> {
    let model = reactor.model();
    let config = reactor.config();
    let registry = &model.registry;
    let retention = reactor.retention();

    let mut influent = 0.0;
    let mut effluent = 0.0;
    let mut liquid_accumulation = 0.0;
    for (i, (id, c)) in evaluation.liquid.iter().enumerate() {
        let cod = Conserved::Cod.content(registry.get(id)?);
        influent += config.flow * reactor.influent().values()[i] * cod;
        effluent += config.flow * c * (1.0 - retention[i]) * cod;
        liquid_accumulation += config.liquid_volume * evaluation.liquid_derivative[i] * cod;
    }

    let mut gas_out = 0.0;
    let mut gas_accumulation = 0.0;
    for ((species, c), dc) in model.gas.species.iter().zip(gas).zip(&evaluation.gas_derivative) {
        let cod = Conserved::Cod.content(registry.get(&species.gas)?);
        gas_out += evaluation.gas_flow * c.max(0.0) * cod;
        gas_accumulation += config.gas_volume * dc * cod;
    }

    let accumulation = liquid_accumulation + gas_accumulation;
    Ok(CodBalance {
        influent,
        effluent,
        gas: gas_out,
        accumulation,
        residual: influent - effluent - gas_out - accumulation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::layout;

    fn diagnostics(ph: f64) -> Diagnostics {
        Diagnostics {
            ph,
            free_ammonia: 0.0,
            dissolved_co2: 0.0,
            ionic_strength: 0.0,
            inhibition: IndexMap::new(),
            inhibition_groups: IndexMap::new(),
            minerals: IndexMap::new(),
            nitrogen_buffer_limited: false,
            cod_balance: CodBalance {
                influent: 0.0,
                effluent: 0.0,
                gas: 0.0,
                accumulation: 0.0,
                residual: 0.0,
            },
        }
    }

    fn minimum(nitrogen: f64) -> ConcentrationVector {
        ConcentrationVector::from_values(layout(&["S_ac", "S_IN"]), vec![0.2, nitrogen]).unwrap()
    }

    #[test]
    fn test_depleted_nitrogen_during_run_flags_acidified_vessel() {
        let settings = DiagnosticSettings::default();
        let mut acidified = diagnostics(5.0);
        acidified.include_run_history(&minimum(1e-5), &settings);
        assert!(acidified.nitrogen_buffer_limited);
    }

    #[test]
    fn test_run_history_needs_both_depletion_and_low_ph() {
        let settings = DiagnosticSettings::default();

        let mut buffered = diagnostics(5.0);
        buffered.include_run_history(&minimum(0.1), &settings);
        assert!(!buffered.nitrogen_buffer_limited);

        let mut recovered = diagnostics(7.2);
        recovered.include_run_history(&minimum(1e-5), &settings);
        assert!(!recovered.nitrogen_buffer_limited);
    }

    #[test]
    fn test_settings_fill_missing_fields() {
        let settings: DiagnosticSettings =
            serde_json::from_str(r#"{"acidified_ph": 6.0}"#).unwrap();
        assert_eq!(settings.acidified_ph, 6.0);
        assert_eq!(settings.nitrogen_component, "S_IN");
        assert_eq!(settings.acid_components.len(), 4);
    }
}
