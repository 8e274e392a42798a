//! Conservation tests for the extended ADM1 network.
//!
//! These tests verify that:
//! - every reaction row conserves COD, carbon, nitrogen and phosphorus
//! - the vessel balances hold at an arbitrary operating point
//! - the optional hydrogen sulfide volatile is inert when no sulfide is present

use approx::assert_relative_eq;
use rsadm_adm1::parameters::Adm1Parameters;
use rsadm_adm1::presets;
use rsadm_adm1::{build_model, ModelOptions};
use rsadm_core::diagnostics::cod_balance;
use rsadm_core::process::{Conserved, ProcessClass};
use rsadm_core::reactor::{Evaluation, ReactionModel, Reactor, ReactorState};

const CONSERVED: [Conserved; 4] = [
    Conserved::Cod,
    Conserved::Carbon,
    Conserved::Nitrogen,
    Conserved::Phosphorus,
];

fn evaluate_bsm2(model: &ReactionModel) -> (Reactor<'_>, ReactorState, Evaluation) {
    let digester = presets::bsm2_digester();
    let reactor = digester.reactor(model).unwrap();
    let state = ReactorState::from_record(model, reactor.config(), &digester.initial).unwrap();
    let evaluation = reactor.evaluate(&state.liquid, state.gas.values()).unwrap();
    (reactor, state, evaluation)
}

/// Net inflow minus accumulation of a conserved quantity, liquid and headspace.
fn vessel_residual(
    reactor: &Reactor,
    evaluation: &Evaluation,
    gas: &[f64],
    conserved: Conserved,
) -> (f64, f64) {
    let model = reactor.model();
    let config = reactor.config();
    let mut inflow = 0.0;
    let mut residual = 0.0;
    for (i, (id, c)) in evaluation.liquid.iter().enumerate() {
        let content = conserved.content(model.registry.get(id).unwrap());
        let c_in = reactor.influent().values()[i];
        inflow += config.flow * c_in * content;
        residual += content
            * (config.flow * (c_in - c) - config.liquid_volume * evaluation.liquid_derivative[i]);
    }
    for ((species, c), dc) in model.gas.species.iter().zip(gas).zip(&evaluation.gas_derivative) {
        let content = conserved.content(model.registry.get(&species.gas).unwrap());
        residual -= content * (evaluation.gas_flow * c + config.gas_volume * dc);
    }
    (inflow, residual)
}

mod stoichiometry {
    use super::*;

    /// Every row other than gas transfer must close all four balances.
    #[test]
    fn test_reaction_rows_are_balanced() {
        let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
        for process in model.rate_table.processes() {
            if process.class == ProcessClass::GasTransfer {
                continue;
            }
            for conserved in CONSERVED {
                let residual = process.balance_residual(&model.registry, conserved).unwrap();
                assert!(
                    residual.abs() < 1e-10,
                    "{} leaks {:?}: {}",
                    process.name,
                    conserved,
                    residual
                );
            }
        }
    }

    #[test]
    fn test_precipitation_draws_ions_in_formula_ratio() {
        let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
        let row = model.rate_table.index_of("precipitation_X_HAP").unwrap();
        let hap = &model.rate_table.processes()[row];
        let ca = hap.stoichiometry["S_Ca"];
        let p = hap.stoichiometry["S_IP"];
        assert_relative_eq!(ca / p, 5.0 / 3.0);
        assert!(!hap.stoichiometry.contains_key("OH-"));
    }
}

mod vessel_balances {
    use super::*;

    #[test]
    fn test_cod_balance_closes_at_bsm2_state() {
        let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
        let (reactor, state, evaluation) = evaluate_bsm2(&model);
        let balance = cod_balance(&reactor, &evaluation, state.gas.values()).unwrap();
        assert!(balance.influent > 0.0);
        assert!(balance.gas > 0.0);
        assert!(
            balance.residual.abs() < 1e-6 * balance.influent,
            "COD residual {} of {}",
            balance.residual,
            balance.influent
        );
    }

    #[test]
    fn test_elemental_balances_close_at_bsm2_state() {
        let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
        let (reactor, state, evaluation) = evaluate_bsm2(&model);
        for conserved in [Conserved::Carbon, Conserved::Nitrogen, Conserved::Phosphorus] {
            let (inflow, residual) =
                vessel_residual(&reactor, &evaluation, state.gas.values(), conserved);
            assert!(inflow > 0.0);
            assert!(
                residual.abs() < 1e-6 * inflow,
                "{:?} residual {} of {}",
                conserved,
                residual,
                inflow
            );
        }
    }
}

mod hydrogen_sulfide_volatile {
    use super::*;

    /// Without sulfide the four-species headspace behaves like the three-species one.
    #[test]
    fn test_stripping_is_inert_without_sulfide() {
        let params = Adm1Parameters::default();
        let three = build_model(&params, &ModelOptions::core()).unwrap();
        let four = build_model(
            &params,
            &ModelOptions {
                h2s_stripping: true,
                ..ModelOptions::core()
            },
        )
        .unwrap();
        assert_eq!(three.gas.len(), 3);
        assert_eq!(four.gas.len(), 4);

        let (_, _, a) = evaluate_bsm2(&three);
        let (_, _, b) = evaluate_bsm2(&four);
        assert_relative_eq!(a.gas_flow, b.gas_flow, max_relative = 1e-12);
        for (x, y) in a.liquid_derivative.iter().zip(&b.liquid_derivative) {
            assert_relative_eq!(*x, *y, max_relative = 1e-10, epsilon = 1e-14);
        }
        for (x, y) in a.gas_derivative.iter().zip(&b.gas_derivative) {
            assert_relative_eq!(*x, *y, max_relative = 1e-10, epsilon = 1e-14);
        }
        assert_eq!(b.gas_derivative[3], 0.0);
    }
}
