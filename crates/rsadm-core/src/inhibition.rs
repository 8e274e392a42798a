//! Inhibition and limitation factors.
//!
//! Every factor is a pure function of a concentration or of pH and lies in `[0, 1]`.
//! Rate laws multiply a list of [`InhibitionTerm`]s; the labelled breakdown is kept for
//! diagnostics.

use crate::equilibrium::EquilibriumState;
use crate::errors::AdmResult;
use crate::state::ConcentrationVector;
use serde::{Deserialize, Serialize};

/// Monod saturation `s / (s + k)`.
pub fn monod(s: f64, k: f64) -> f64 {
    if s <= 0.0 {
        0.0
    } else {
        s / (s + k.max(0.0))
    }
}

/// Non-competitive inhibition `1 / (1 + c / k_i)`.
pub fn non_competitive(c: f64, k_i: f64) -> f64 {
    if c <= 0.0 {
        1.0
    } else if k_i <= 0.0 {
        0.0
    } else {
        1.0 / (1.0 + c / k_i)
    }
}

/// Lower-sided Hill inhibition by low pH.
///
/// Half inhibition at the midpoint of `[lower, upper]`; 1 well above `upper`.
pub fn ph_hill(ph: f64, lower: f64, upper: f64) -> f64 {
    if upper <= lower {
        return if ph >= upper { 1.0 } else { 0.0 };
    }
    let n = 3.0 / (upper - lower);
    let pk = 0.5 * (lower + upper);
    // (h/K)^n evaluated in log space; saturates cleanly at extreme pH
    1.0 / (1.0 + 10f64.powf(n * (pk - ph)))
}

/// Two-sided inhibition, equal to 1 at the midpoint of `[lower, upper]`.
pub fn ph_double_sided(ph: f64, lower: f64, upper: f64) -> f64 {
    let peak = 1.0 + 2.0 * 10f64.powf(0.5 * (lower - upper));
    let value = peak / (1.0 + 10f64.powf(ph - upper) + 10f64.powf(lower - ph));
    value.clamp(0.0, 1.0)
}

/// What an inhibition or limitation term reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A registry component, in its own concentration unit
    Component(String),
    /// An equilibrium species, in kmol/m³
    Species(String),
}

impl Target {
    fn value(&self, conc: &ConcentrationVector, equilibrium: &EquilibriumState) -> AdmResult<f64> {
        match self {
            Target::Component(id) => conc.get(id).map(|c| c.max(0.0)),
            Target::Species(name) => equilibrium.species_concentration(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Target::Component(id) => id,
            Target::Species(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InhibitionTerm {
    PhHill { lower: f64, upper: f64 },
    PhDoubleSided { lower: f64, upper: f64 },
    NonCompetitive { inhibitor: Target, k_i: f64 },
    /// Monod limitation by a nutrient other than the substrate
    Limitation { nutrient: Target, k_s: f64 },
}

impl InhibitionTerm {
    pub fn ph_hill(lower: f64, upper: f64) -> Self {
        InhibitionTerm::PhHill { lower, upper }
    }

    pub fn component(id: &str, k_i: f64) -> Self {
        InhibitionTerm::NonCompetitive {
            inhibitor: Target::Component(id.to_string()),
            k_i,
        }
    }

    pub fn species(name: &str, k_i: f64) -> Self {
        InhibitionTerm::NonCompetitive {
            inhibitor: Target::Species(name.to_string()),
            k_i,
        }
    }

    pub fn limitation(id: &str, k_s: f64) -> Self {
        InhibitionTerm::Limitation {
            nutrient: Target::Component(id.to_string()),
            k_s,
        }
    }

    /// Label used in diagnostics, e.g. `pH`, `inhibition:NH3` or `limitation:S_IN`.
    pub fn label(&self) -> String {
        match self {
            InhibitionTerm::PhHill { .. } | InhibitionTerm::PhDoubleSided { .. } => {
                "pH".to_string()
            }
            InhibitionTerm::NonCompetitive { inhibitor, .. } => {
                format!("inhibition:{}", inhibitor.name())
            }
            InhibitionTerm::Limitation { nutrient, .. } => {
                format!("limitation:{}", nutrient.name())
            }
        }
    }

    /// Components read by this term.
    pub fn component_ids(&self) -> Vec<String> {
        match self {
            InhibitionTerm::NonCompetitive {
                inhibitor: Target::Component(id),
                ..
            }
            | InhibitionTerm::Limitation {
                nutrient: Target::Component(id),
                ..
            } => vec![id.clone()],
            _ => vec![],
        }
    }

    pub fn factor(
        &self,
        conc: &ConcentrationVector,
        equilibrium: &EquilibriumState,
    ) -> AdmResult<f64> {
        Ok(match self {
            InhibitionTerm::PhHill { lower, upper } => ph_hill(equilibrium.ph, *lower, *upper),
            InhibitionTerm::PhDoubleSided { lower, upper } => {
                ph_double_sided(equilibrium.ph, *lower, *upper)
            }
            InhibitionTerm::NonCompetitive { inhibitor, k_i } => {
                non_competitive(inhibitor.value(conc, equilibrium)?, *k_i)
            }
            InhibitionTerm::Limitation { nutrient, k_s } => {
                monod(nutrient.value(conc, equilibrium)?, *k_s)
            }
        })
    }
}

/// Product of all factors together with the individual labelled values.
pub fn combined(
    terms: &[InhibitionTerm],
    conc: &ConcentrationVector,
    equilibrium: &EquilibriumState,
) -> AdmResult<(f64, Vec<(String, f64)>)> {
    let mut product = 1.0;
    let mut breakdown = Vec::with_capacity(terms.len());
    for term in terms {
        let factor = term.factor(conc, equilibrium)?;
        product *= factor;
        breakdown.push((term.label(), factor));
    }
    Ok((product, breakdown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_monod_saturates() {
        assert_eq!(monod(0.0, 0.5), 0.0);
        assert_eq!(monod(-1e-9, 0.5), 0.0);
        assert_relative_eq!(monod(0.5, 0.5), 0.5);
        assert!(monod(1e6, 0.5) < 1.0);
        assert_eq!(monod(1.0, 0.0), 1.0);
    }

    #[test]
    fn test_non_competitive() {
        assert_eq!(non_competitive(0.0, 1e-5), 1.0);
        assert_relative_eq!(non_competitive(1e-5, 1e-5), 0.5);
        assert_eq!(non_competitive(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_ph_hill_matches_bsm2_form() {
        let (lower, upper) = (6.0, 7.0);
        // BSM2: K^n / (S_H^n + K^n) with K = 10^-(LL+UL)/2, n = 3/(UL-LL)
        for ph in [5.0, 6.2, 6.5, 7.4, 8.0] {
            let n = 3.0 / (upper - lower);
            let k: f64 = 10f64.powf(-(lower + upper) / 2.0);
            let h: f64 = 10f64.powf(-ph);
            let expected = k.powf(n) / (h.powf(n) + k.powf(n));
            assert_relative_eq!(ph_hill(ph, lower, upper), expected, epsilon = 1e-12);
        }
        assert_relative_eq!(ph_hill(6.5, lower, upper), 0.5);
        assert!(ph_hill(0.0, lower, upper) >= 0.0);
        assert!(ph_hill(14.0, lower, upper) <= 1.0);
    }

    #[test]
    fn test_ph_double_sided_peaks_at_midpoint() {
        assert_relative_eq!(ph_double_sided(6.5, 6.0, 7.0), 1.0, epsilon = 1e-12);
        assert!(ph_double_sided(4.0, 6.0, 7.0) < 0.1);
        assert!(ph_double_sided(9.0, 6.0, 7.0) < 0.1);
    }

    #[test]
    fn test_factors_are_bounded() {
        for x in [0.0, 1e-12, 1e-6, 1e-3, 1.0, 1e3] {
            for k in [0.0, 1e-6, 1.0] {
                for f in [monod(x, k), non_competitive(x, k)] {
                    assert!((0.0..=1.0).contains(&f));
                }
            }
        }
    }
}
