//! Calcite precipitation and dissolution inside the full network.
//!
//! The benchmark digester is evaluated with calcium and seeded calcite set so the
//! liquid is either supersaturated or undersaturated with respect to calcite.

use rsadm_adm1::parameters::Adm1Parameters;
use rsadm_adm1::presets;
use rsadm_adm1::{build_model, ModelOptions};
use rsadm_core::reactor::{Evaluation, ReactionModel, ReactorState};

const ROW: &str = "precipitation_X_CCM";

fn evaluate(model: &ReactionModel, calcium: f64, calcite: f64) -> Evaluation {
    let digester = presets::bsm2_digester();
    let reactor = digester.reactor(model).unwrap();
    let mut state =
        ReactorState::from_record(model, reactor.config(), &digester.initial).unwrap();
    state.liquid.set("S_Ca", calcium).unwrap();
    state.liquid.set("X_CCM", calcite).unwrap();
    reactor.evaluate(&state.liquid, state.gas.values()).unwrap()
}

fn derivative(evaluation: &Evaluation, id: &str) -> f64 {
    let column = evaluation.liquid.index_of(id).unwrap();
    evaluation.liquid_derivative[column]
}

#[test]
fn test_supersaturated_calcite_precipitates_and_draws_calcium() {
    let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
    let row = model.rate_table.index_of(ROW).unwrap();
    let evaluation = evaluate(&model, 0.01, 0.1);

    let saturation = &evaluation.environment.saturation["X_CCM"];
    assert!(saturation.saturation_index > 1.0, "SI {}", saturation.saturation_index);
    assert!(evaluation.rates[row] > 0.0);
    assert!(derivative(&evaluation, "S_Ca") < 0.0);
    assert!(derivative(&evaluation, "X_CCM") > 0.0);
}

#[test]
fn test_undersaturated_calcite_dissolves_and_releases_calcium() {
    let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
    let row = model.rate_table.index_of(ROW).unwrap();
    let evaluation = evaluate(&model, 1e-6, 0.1);

    let saturation = &evaluation.environment.saturation["X_CCM"];
    assert!(saturation.saturation_index < 1.0, "SI {}", saturation.saturation_index);
    assert!(evaluation.rates[row] < 0.0);
    assert!(derivative(&evaluation, "S_Ca") > 0.0);
    assert!(derivative(&evaluation, "X_CCM") < 0.0);
}

#[test]
fn test_exhausted_calcite_does_not_dissolve() {
    let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
    let row = model.rate_table.index_of(ROW).unwrap();
    let evaluation = evaluate(&model, 1e-6, 0.0);

    assert!(evaluation.environment.saturation["X_CCM"].saturation_index < 1.0);
    assert_eq!(evaluation.rates[row], 0.0);
}
