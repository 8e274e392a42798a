//! Dynamic simulation of anaerobic digestion reactors
//!
//! `core` holds the model-independent kernel: components, equilibrium chemistry,
//! rate laws, the reactor and its integrator. `adm1` builds the extended ADM1
//! network on top of it.
//!
//! ```no_run
//! use rsadm::adm1::{build_model, parameters::Adm1Parameters, presets, ModelOptions};
//! use rsadm::core::reactor::{ReactorState, Simulation, SimulationSettings};
//!
//! let model = build_model(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
//! let digester = presets::bsm2_digester();
//! let reactor = digester.reactor(&model).unwrap();
//! let initial = ReactorState::from_record(&model, reactor.config(), &digester.initial).unwrap();
//! let outcome = Simulation::new(&reactor, initial, SimulationSettings::default()).run();
//! println!("{:?}", outcome.status);
//! ```

pub use rsadm_adm1 as adm1;
pub use rsadm_core as core;
