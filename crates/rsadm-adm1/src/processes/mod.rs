//! Process groups of the extended network
//!
//! - `biochemical`: the 19 ADM1 processes
//! - `phosphorus`: PHA storage by PAO and PAO/PP/PHA lysis
//! - `sulfur`: sulfate reduction by four SRB groups and their decay
//! - `iron`: abiotic Fe(III) reduction by hydrogen and sulfide
//! - `physicochemical`: mineral precipitation and gas-liquid transfer
//!
//! Biological rows are balanced for carbon, nitrogen and phosphorus through the
//! inorganic pools after their organic coefficients are set.

pub mod biochemical;
pub mod iron;
pub mod phosphorus;
pub mod physicochemical;
pub mod sulfur;

use rsadm_core::component::ComponentRegistry;
use rsadm_core::errors::AdmResult;
use rsadm_core::process::{Conserved, Process, ProcessClass, RateLaw};

pub(crate) fn biological(name: &str, law: impl RateLaw + 'static) -> Process {
    Process::new(name, ProcessClass::Biological, law)
}

/// Close carbon, nitrogen and phosphorus through `S_IC`, `S_IN` and `S_IP`.
pub fn close_nutrients(process: Process, registry: &ComponentRegistry) -> AdmResult<Process> {
    process
        .closed_by(registry, "S_IC", Conserved::Carbon)?
        .closed_by(registry, "S_IN", Conserved::Nitrogen)?
        .closed_by(registry, "S_IP", Conserved::Phosphorus)
}
