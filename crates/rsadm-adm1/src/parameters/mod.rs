//! Parameter sets of the extended ADM1 network.
//!
//! Every struct uses `#[serde(default)]`, so a TOML or JSON document only needs to
//! name the values that differ from the defaults.

mod iron;
mod kinetics;
mod minerals;
mod phosphorus;
mod physicochemical;
mod stoichiometry;
mod sulfur;

pub use iron::IronParameters;
pub use kinetics::{KineticParameters, PhLimits};
pub use minerals::{IonShare, MineralDefinition, MineralParameters};
pub use phosphorus::PhosphorusParameters;
pub use physicochemical::{Dissociation, PhysicochemicalParameters, Solubility};
pub use stoichiometry::StoichiometricParameters;
pub use sulfur::{SrbGroup, SulfurParameters};

use rsadm_core::errors::AdmResult;
use rsadm_core::records::{from_json_str, from_toml_str};
use serde::{Deserialize, Serialize};

/// The complete parameter set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adm1Parameters {
    pub stoichiometry: StoichiometricParameters,
    pub kinetics: KineticParameters,
    pub physicochemical: PhysicochemicalParameters,
    pub phosphorus: PhosphorusParameters,
    pub sulfur: SulfurParameters,
    pub iron: IronParameters,
    pub minerals: MineralParameters,
}

impl Adm1Parameters {
    pub fn from_toml(text: &str) -> AdmResult<Self> {
        from_toml_str(text)
    }

    pub fn from_json(text: &str) -> AdmResult<Self> {
        from_json_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_overrides_single_values() {
        let params = Adm1Parameters::from_toml(
            r#"
            [kinetics]
            k_m_ac = 10.0

            [kinetics.ph_ac]
            lower = 5.5
            upper = 7.0

            [physicochemical]
            k_la = 150.0
            "#,
        )
        .unwrap();
        assert_eq!(params.kinetics.k_m_ac, 10.0);
        assert_eq!(params.kinetics.ph_ac, PhLimits::new(5.5, 7.0));
        assert_eq!(params.kinetics.k_m_h2, 35.0);
        assert_eq!(params.physicochemical.k_la, 150.0);
        assert_eq!(params.minerals.minerals.len(), 13);
    }

    #[test]
    fn test_wrong_value_type_is_a_parse_error() {
        let err = Adm1Parameters::from_json(r#"{"kinetics": {"k_m_ac": "fast"}}"#).unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }
}
