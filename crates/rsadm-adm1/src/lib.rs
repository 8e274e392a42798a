//! Extended ADM1 network for the rsadm kernel
//!
//! This crate builds the Anaerobic Digestion Model No. 1 with BSM2 parameters and
//! extends it with phosphorus-accumulating organisms, sulfate reduction, iron redox
//! chemistry and thirteen precipitating minerals. The result is a
//! [`rsadm_core::reactor::ReactionModel`] that the kernel integrates.
//!
//! # Module Organisation
//!
//! - `components`: the component registry, with COD and elemental contents
//! - `processes`: rate laws and stoichiometry, grouped by domain
//!   (biochemical, phosphorus, sulfur, iron, physicochemical)
//! - `model`: assembly of the enabled groups and the acid-base system
//! - `presets`: the BSM2 digester as a ready-made run record
//!
//! # Parameters
//!
//! Each process group has a parameters struct in the `parameters` module with
//! defaults matching the BSM2 implementation of ADM1. Any subset may be
//! overridden from TOML or JSON.

pub mod components;
pub mod model;
pub mod parameters;
pub mod presets;
pub mod processes;

pub use model::{build_model, ModelOptions};
