//! Long-run behaviour of the digester.
//!
//! A healthy run of the benchmark digester must settle to a methanogenic steady
//! state; the same digester started without its ammonium buffer must end
//! acidified and flagged.

use rsadm_adm1::parameters::Adm1Parameters;
use rsadm_adm1::presets;
use rsadm_adm1::{build_model, ModelOptions};
use rsadm_core::diagnostics::DiagnosticSettings;
use rsadm_core::reactor::{
    ReactorState, RunStatus, Simulation, SimulationSettings, SteadyStateCriterion,
};
use rsadm_core::records::{ConvergenceStatus, DigesterRecord, RunReport};
use rsadm_core::state::ConcentrationRecord;

fn run(model_options: ModelOptions, digester: &DigesterRecord, max_time: f64) -> RunReport {
    let model = build_model(&Adm1Parameters::default(), &model_options).unwrap();
    let reactor = digester.reactor(&model).unwrap();
    let initial = ReactorState::from_record(&model, reactor.config(), &digester.initial).unwrap();
    let settings = SimulationSettings {
        steady_state: SteadyStateCriterion {
            max_time,
            ..SteadyStateCriterion::default()
        },
        ..SimulationSettings::default()
    };
    let outcome = Simulation::new(&reactor, initial, settings).run();
    assert!(
        !matches!(outcome.status, RunStatus::Failed { .. }),
        "run failed: {:?}",
        outcome.status
    );
    RunReport::new(&reactor, &outcome, &DiagnosticSettings::default()).unwrap()
}

fn set(record: &mut ConcentrationRecord, id: &str, value: f64) {
    record.insert(id.to_string(), value.into());
}

mod healthy {
    use super::*;

    #[test]
    fn test_bsm2_digester_reaches_methanogenic_steady_state() {
        let report = run(ModelOptions::default(), &presets::bsm2_digester(), 150.0);

        assert_eq!(report.convergence.status, ConvergenceStatus::Completed);
        let diagnostics = &report.diagnostics;
        assert!(
            (6.5..=7.5).contains(&diagnostics.ph),
            "pH {}",
            diagnostics.ph
        );
        assert!(!diagnostics.nitrogen_buffer_limited);

        let methane = report.gas.species["G_ch4"].volume_percent;
        assert!((50.0..75.0).contains(&methane), "CH4 {} %", methane);
        assert!(report.gas.flow > 1000.0 && report.gas.flow < 5000.0);
        assert!(report.gas.species["G_h2s"].ppm < 1e-6);

        let balance = diagnostics.cod_balance;
        assert!(balance.residual.abs() < 1e-6 * balance.influent);
        // Most of the degradable COD leaves as methane
        assert!(balance.gas > 0.5 * (balance.influent - balance.effluent));
    }

    #[test]
    fn test_report_serialises() {
        let report = run(ModelOptions::core(), &presets::bsm2_digester(), 10.0);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"nitrogen_buffer_limited\": false"));
        assert!(json.contains("G_co2"));
    }
}

mod acidified {
    use super::*;

    /// The benchmark digester started with its ammonium buffer removed.
    fn unbuffered_digester() -> DigesterRecord {
        let mut digester = presets::bsm2_digester();
        set(&mut digester.initial, "S_IN", 1e-5);
        digester
    }

    #[test]
    fn test_unbuffered_start_acidifies_and_is_flagged() {
        let report = run(ModelOptions::core(), &unbuffered_digester(), 300.0);

        assert_ne!(report.convergence.status, ConvergenceStatus::Failed);
        let diagnostics = &report.diagnostics;
        assert!(diagnostics.ph < 6.0, "pH {}", diagnostics.ph);
        // Methanogenesis has stalled and acetate accumulated
        let acetate = report.effluent.concentrations["S_ac"];
        assert!(acetate > 1.0, "S_ac {}", acetate);
        assert!(diagnostics.inhibition["uptake_acetate"].factors["pH"] < 0.1);
        assert!(diagnostics.nitrogen_buffer_limited);
    }
}

mod nitrogen_buffer {
    use super::*;
    use rsadm_core::diagnostics::Diagnostics;

    fn diagnostics(changes: &[(&str, f64)]) -> Diagnostics {
        let model = build_model(&Adm1Parameters::default(), &ModelOptions::core()).unwrap();
        let digester = presets::bsm2_digester();
        let reactor = digester.reactor(&model).unwrap();
        let mut state =
            ReactorState::from_record(&model, reactor.config(), &digester.initial).unwrap();
        for (id, value) in changes {
            state.liquid.set(id, *value).unwrap();
        }
        let evaluation = reactor.evaluate(&state.liquid, state.gas.values()).unwrap();
        Diagnostics::from_evaluation(
            &reactor,
            &evaluation,
            state.gas.values(),
            &DiagnosticSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_benchmark_state_is_buffered() {
        let diagnostics = diagnostics(&[]);
        assert!(diagnostics.ph > 7.0);
        assert!(!diagnostics.nitrogen_buffer_limited);
    }

    /// Ammonium is above the floor and not limiting growth, but cannot
    /// neutralise the accumulated acetate.
    #[test]
    fn test_acid_load_exceeding_ammonium_is_flagged() {
        let diagnostics = diagnostics(&[("S_IN", 0.01), ("S_ac", 15.0)]);
        assert!(diagnostics.ph < 6.5, "pH {}", diagnostics.ph);
        assert!(diagnostics.inhibition_groups["limitation:S_IN"] > 0.5);
        assert!(diagnostics.nitrogen_buffer_limited);
    }
}
