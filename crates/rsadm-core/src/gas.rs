//! Headspace model.
//!
//! The set of volatile species belongs to the reaction model; every array here is sized
//! from [`GasPhase::species`] rather than from a fixed count, so a variant that strips
//! hydrogen sulfide simply carries one more entry.

use crate::component::{ComponentRegistry, PhaseClass};
use crate::errors::{AdmError, AdmResult};
use crate::process::{ProcessClass, RateTable};
use crate::state::{layout, Layout};
use indexmap::IndexMap;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Ideal gas constant
/// unit: bar m^3/(kmol K)
pub const R_GAS: f64 = 0.083145;

/// Saturated water vapour pressure (bar) at `temperature` (K).
pub fn water_vapour_pressure(temperature: f64) -> f64 {
    0.0313 * (5290.0 * (1.0 / 298.15 - 1.0 / temperature)).exp()
}

/// A volatile species and the process exchanging it with the liquid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasSpecies {
    /// Gas component id
    pub gas: String,
    /// Name of the gas-transfer process
    pub transfer_process: String,
    /// kmol of gas per unit of gas concentration
    pub kmol_per_unit: f64,
    /// Gas concentration units per liquid concentration unit transferred
    #[serde(default = "unit_conversion")]
    pub conversion: f64,
}

fn unit_conversion() -> f64 {
    1.0
}

impl GasSpecies {
    pub fn new(gas: &str, transfer_process: &str, kmol_per_unit: f64) -> Self {
        Self {
            gas: gas.to_string(),
            transfer_process: transfer_process.to_string(),
            kmol_per_unit,
            conversion: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PressureMode {
    /// Headspace held at a constant total pressure; all produced gas leaves
    Fixed {
        /// unit: bar
        pressure: f64,
    },
    /// Gas leaves through an orifice driven by overpressure
    Variable {
        /// unit: m^3/(d bar)
        k_p: f64,
        /// unit: bar
        p_atm: f64,
    },
}

impl Default for PressureMode {
    fn default() -> Self {
        PressureMode::Variable {
            k_p: 5e4,
            p_atm: 1.013,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasPhase {
    pub species: Vec<GasSpecies>,
    /// Row of each species' transfer process in the rate table
    transfer_rows: Vec<usize>,
}

impl GasPhase {
    /// # Errors
    ///
    /// Fails if a gas id is not a registered gas component or its transfer process is
    /// missing from `table` or is not a gas-transfer process.
    pub fn new(
        registry: &ComponentRegistry,
        table: &RateTable,
        species: Vec<GasSpecies>,
    ) -> AdmResult<Self> {
        let mut transfer_rows = Vec::with_capacity(species.len());
        for s in &species {
            if registry.get(&s.gas)?.phase_class != PhaseClass::Gas {
                return Err(AdmError::InvalidConfiguration(format!(
                    "'{}' is not a gas component",
                    s.gas
                )));
            }
            let row = table
                .index_of(&s.transfer_process)
                .filter(|&i| table.processes()[i].class == ProcessClass::GasTransfer)
                .ok_or_else(|| {
                    AdmError::InvalidConfiguration(format!(
                        "no gas-transfer process '{}' for '{}'",
                        s.transfer_process, s.gas
                    ))
                })?;
            transfer_rows.push(row);
        }
        Ok(Self {
            species,
            transfer_rows,
        })
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn layout(&self) -> Layout {
        let ids: Vec<&str> = self.species.iter().map(|s| s.gas.as_str()).collect();
        layout(&ids)
    }

    /// Transfer rates of every species, picked from the full process rate vector.
    pub fn transfer_rates(&self, rates: &Array1<f64>) -> Vec<f64> {
        self.transfer_rows.iter().map(|&row| rates[row]).collect()
    }

    fn check_len(&self, what: &str, len: usize) -> AdmResult<()> {
        if len != self.species.len() {
            return Err(AdmError::InvalidConfiguration(format!(
                "got {} {} for {} gas species",
                len,
                what,
                self.species.len()
            )));
        }
        Ok(())
    }

    /// Partial pressure (bar) of every species.
    pub fn partial_pressures(&self, gas_conc: &[f64], temperature: f64) -> AdmResult<Vec<f64>> {
        self.check_len("gas concentrations", gas_conc.len())?;
        Ok(self
            .species
            .iter()
            .zip(gas_conc)
            .map(|(s, c)| c.max(0.0) * s.kmol_per_unit * R_GAS * temperature)
            .collect())
    }

    /// Partial pressures keyed by gas id.
    pub fn pressure_map(
        &self,
        gas_conc: &[f64],
        temperature: f64,
    ) -> AdmResult<IndexMap<String, f64>> {
        let pressures = self.partial_pressures(gas_conc, temperature)?;
        Ok(self
            .species
            .iter()
            .map(|s| s.gas.clone())
            .zip(pressures)
            .collect())
    }

    /// Total headspace pressure including water vapour.
    pub fn total_pressure(&self, gas_conc: &[f64], temperature: f64) -> AdmResult<f64> {
        Ok(self.partial_pressures(gas_conc, temperature)?.iter().sum::<f64>()
            + water_vapour_pressure(temperature))
    }

    /// Volumetric gas outflow (m³/d), never negative.
    ///
    /// `gas_rates` are the liquid-side transfer rates of each species.
    pub fn compute_gas_flow(
        &self,
        gas_rates: &[f64],
        gas_conc: &[f64],
        temperature: f64,
        liquid_volume: f64,
        mode: &PressureMode,
    ) -> AdmResult<f64> {
        self.check_len("gas transfer rates", gas_rates.len())?;
        let flow = match *mode {
            PressureMode::Fixed { pressure } => {
                let dry = pressure - water_vapour_pressure(temperature);
                if dry <= 0.0 {
                    return Err(AdmError::InvalidConfiguration(format!(
                        "headspace pressure {} bar is below the water vapour pressure",
                        pressure
                    )));
                }
                let molar_production: f64 = self
                    .species
                    .iter()
                    .zip(gas_rates)
                    .map(|(s, r)| r * s.conversion * s.kmol_per_unit)
                    .sum();
                R_GAS * temperature / dry * liquid_volume * molar_production
            }
            PressureMode::Variable { k_p, p_atm } => {
                let p_gas = self.total_pressure(gas_conc, temperature)?;
                k_p * (p_gas - p_atm) * p_gas / p_atm
            }
        };
        Ok(flow.max(0.0))
    }

    /// `dC/dt = −q_gas·C/V_gas + rate·conversion·V_liq/V_gas` for every species.
    pub fn gas_phase_derivative(
        &self,
        gas_rates: &[f64],
        gas_conc: &[f64],
        q_gas: f64,
        liquid_volume: f64,
        gas_volume: f64,
    ) -> AdmResult<Vec<f64>> {
        self.check_len("gas transfer rates", gas_rates.len())?;
        self.check_len("gas concentrations", gas_conc.len())?;
        Ok(self
            .species
            .iter()
            .zip(gas_rates.iter().zip(gas_conc))
            .map(|(s, (rate, c))| {
                -q_gas * c / gas_volume + rate * s.conversion * liquid_volume / gas_volume
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Basis, Component, MeasuredAs};
    use crate::equilibrium::VantHoff;
    use crate::inhibition::Target;
    use crate::process::{GasTransfer, Process};
    use approx::assert_relative_eq;

    fn gas_component(id: &str) -> Component {
        Component::new(id, PhaseClass::Gas, MeasuredAs::Molecule, Basis::Molar, 1.0)
    }

    fn transfer(name: &str, liquid: &str, gas: &str) -> Process {
        Process::new(
            name,
            ProcessClass::GasTransfer,
            GasTransfer {
                dissolved: Target::Component(liquid.to_string()),
                gas: gas.to_string(),
                k_la: 200.0,
                henry: VantHoff::new(1e-3, 0.0),
                liquid_per_kmol: 1.0,
            },
        )
        .with(liquid, -1.0)
    }

    fn phase(n: usize) -> GasPhase {
        let mut registry = ComponentRegistry::new();
        let mut processes = vec![];
        let mut species = vec![];
        let mut liquid = vec![];
        for i in 0..n {
            let (s, g, p) = (format!("S_{}", i), format!("G_{}", i), format!("T_{}", i));
            registry
                .register(Component::ion(s.as_str(), "X", 1.0, 0))
                .unwrap();
            registry.register(gas_component(&g)).unwrap();
            processes.push(transfer(&p, &s, &g));
            species.push(GasSpecies::new(&g, &p, 1.0));
            liquid.push(s);
        }
        let table = RateTable::new(&registry, layout(&liquid), processes).unwrap();
        GasPhase::new(&registry, &table, species).unwrap()
    }

    #[test]
    fn test_water_vapour_reference() {
        assert_relative_eq!(water_vapour_pressure(298.15), 0.0313);
        assert_relative_eq!(water_vapour_pressure(308.15), 0.0557, epsilon = 1e-3);
    }

    #[test]
    fn test_sizes_follow_species_count() {
        for n in [3, 4] {
            let phase = phase(n);
            let rates = Array1::from(vec![0.1; n]);
            let transfer = phase.transfer_rates(&rates);
            assert_eq!(transfer.len(), n);
            let conc = vec![0.01; n];
            let d = phase
                .gas_phase_derivative(&transfer, &conc, 100.0, 3400.0, 300.0)
                .unwrap();
            assert_eq!(d.len(), n);
        }
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let phase = phase(4);
        assert!(phase
            .gas_phase_derivative(&[0.1; 3], &[0.0; 4], 1.0, 1.0, 1.0)
            .is_err());
    }

    #[test]
    fn test_fixed_pressure_flow() {
        let phase = phase(3);
        let t = 308.15;
        let q = phase
            .compute_gas_flow(
                &[1e-3, 0.0, 0.0],
                &[0.0; 3],
                t,
                3400.0,
                &PressureMode::Fixed { pressure: 1.013 },
            )
            .unwrap();
        let expected = R_GAS * t / (1.013 - water_vapour_pressure(t)) * 3400.0 * 1e-3;
        assert_relative_eq!(q, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_variable_pressure_flow_never_negative() {
        let phase = phase(3);
        let mode = PressureMode::default();
        let q = phase
            .compute_gas_flow(&[0.0; 3], &[0.0; 3], 308.15, 3400.0, &mode)
            .unwrap();
        assert_eq!(q, 0.0);

        // 1.2 bar of gas pushes through the orifice
        let c = 1.2 / (R_GAS * 308.15);
        let q = phase
            .compute_gas_flow(&[0.0; 3], &[c, 0.0, 0.0], 308.15, 3400.0, &mode)
            .unwrap();
        assert!(q > 0.0);
    }
}
