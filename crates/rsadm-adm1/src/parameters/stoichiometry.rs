//! Stoichiometric Parameters
//!
//! Product fractions, biomass yields and elemental contents of the ADM1 core
//! network.
//!
//! # Reference
//!
//! Values follow the Benchmark Simulation Model No. 2 parameter set for ADM1
//! (Rosen and Jeppsson, 2006). Phosphorus contents are additions for the
//! phosphorus-extended network; everything else reproduces the benchmark.
//!
//! Elemental contents are expressed per kg COD of the carrying component. The
//! inorganic pools (`S_IC`, `S_IN`, `S_IP`) close every biological row, so the
//! contents only need to be mutually consistent, not exact.

use serde::{Deserialize, Serialize};

/// Stoichiometry of disintegration, hydrolysis, uptake and decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoichiometricParameters {
    // Disintegration products of composites
    /// Soluble inerts from composites
    /// unit: kg COD/kg COD
    /// default: 0.1
    pub f_si_xc: f64,
    /// Particulate inerts from composites
    /// unit: kg COD/kg COD
    /// default: 0.2
    pub f_xi_xc: f64,
    /// unit: kg COD/kg COD
    /// default: 0.2
    pub f_ch_xc: f64,
    /// unit: kg COD/kg COD
    /// default: 0.2
    pub f_pr_xc: f64,
    /// unit: kg COD/kg COD
    /// default: 0.3
    pub f_li_xc: f64,

    /// Fatty acids from lipid hydrolysis (the rest is sugar)
    /// unit: kg COD/kg COD
    /// default: 0.95
    pub f_fa_li: f64,

    // Sugar fermentation products
    /// default: 0.19
    pub f_h2_su: f64,
    /// default: 0.13
    pub f_bu_su: f64,
    /// default: 0.27
    pub f_pro_su: f64,
    /// default: 0.41
    pub f_ac_su: f64,

    // Amino acid fermentation products
    /// default: 0.06
    pub f_h2_aa: f64,
    /// default: 0.23
    pub f_va_aa: f64,
    /// default: 0.26
    pub f_bu_aa: f64,
    /// default: 0.05
    pub f_pro_aa: f64,
    /// default: 0.40
    pub f_ac_aa: f64,

    // Yields
    /// unit: kg COD/kg COD
    /// default: 0.1
    pub y_su: f64,
    /// default: 0.08
    pub y_aa: f64,
    /// default: 0.06
    pub y_fa: f64,
    /// default: 0.06
    pub y_c4: f64,
    /// default: 0.04
    pub y_pro: f64,
    /// default: 0.05
    pub y_ac: f64,
    /// default: 0.06
    pub y_h2: f64,

    // Carbon contents
    /// unit: kmol C/kg COD
    /// default: 0.02786
    pub c_xc: f64,
    /// default: 0.03
    pub c_si: f64,
    /// default: 0.0313
    pub c_ch: f64,
    /// default: 0.03
    pub c_pr: f64,
    /// default: 0.022
    pub c_li: f64,
    /// default: 0.03
    pub c_xi: f64,
    /// default: 0.0313
    pub c_su: f64,
    /// default: 0.03
    pub c_aa: f64,
    /// default: 0.0217
    pub c_fa: f64,
    /// default: 0.024
    pub c_va: f64,
    /// default: 0.025
    pub c_bu: f64,
    /// default: 0.0268
    pub c_pro: f64,
    /// default: 0.0313
    pub c_ac: f64,
    /// default: 0.0156
    pub c_ch4: f64,
    /// default: 0.0313
    pub c_bac: f64,

    // Nitrogen contents
    /// unit: kmol N/kg COD
    /// default: 0.0376/14
    pub n_xc: f64,
    /// Nitrogen in soluble and particulate inerts
    /// default: 0.06/14
    pub n_i: f64,
    /// Nitrogen in amino acids and proteins
    /// default: 0.007
    pub n_aa: f64,
    /// default: 0.08/14
    pub n_bac: f64,

    // Phosphorus contents
    /// unit: kmol P/kg COD
    /// default: 2.4e-4
    pub p_xc: f64,
    /// Phosphorus in soluble and particulate inerts
    /// default: 1.6e-4
    pub p_i: f64,
    /// Phospholipid phosphorus
    /// default: 2.6e-4
    pub p_li: f64,
    /// default: 6.45e-4
    pub p_bac: f64,
}

impl Default for StoichiometricParameters {
    fn default() -> Self {
        Self {
            f_si_xc: 0.1,
            f_xi_xc: 0.2,
            f_ch_xc: 0.2,
            f_pr_xc: 0.2,
            f_li_xc: 0.3,
            f_fa_li: 0.95,
            f_h2_su: 0.19,
            f_bu_su: 0.13,
            f_pro_su: 0.27,
            f_ac_su: 0.41,
            f_h2_aa: 0.06,
            f_va_aa: 0.23,
            f_bu_aa: 0.26,
            f_pro_aa: 0.05,
            f_ac_aa: 0.40,
            y_su: 0.1,
            y_aa: 0.08,
            y_fa: 0.06,
            y_c4: 0.06,
            y_pro: 0.04,
            y_ac: 0.05,
            y_h2: 0.06,
            c_xc: 0.02786,
            c_si: 0.03,
            c_ch: 0.0313,
            c_pr: 0.03,
            c_li: 0.022,
            c_xi: 0.03,
            c_su: 0.0313,
            c_aa: 0.03,
            c_fa: 0.0217,
            c_va: 0.024,
            c_bu: 0.025,
            c_pro: 0.0268,
            c_ac: 0.0313,
            c_ch4: 0.0156,
            c_bac: 0.0313,
            n_xc: 0.0376 / 14.0,
            n_i: 0.06 / 14.0,
            n_aa: 0.007,
            n_bac: 0.08 / 14.0,
            p_xc: 2.4e-4,
            p_i: 1.6e-4,
            p_li: 2.6e-4,
            p_bac: 6.45e-4,
        }
    }
}

impl StoichiometricParameters {
    /// Sum of the composite disintegration fractions, one for a COD-closed split
    pub fn disintegration_total(&self) -> f64 {
        self.f_si_xc + self.f_xi_xc + self.f_ch_xc + self.f_pr_xc + self.f_li_xc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_fractions_sum_to_one() {
        let params = StoichiometricParameters::default();
        assert!((params.disintegration_total() - 1.0).abs() < 1e-12);
        let su = params.f_h2_su + params.f_bu_su + params.f_pro_su + params.f_ac_su;
        let aa = params.f_h2_aa + params.f_va_aa + params.f_bu_aa + params.f_pro_aa + params.f_ac_aa;
        assert!((su - 1.0).abs() < 1e-12);
        assert!((aa - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let params: StoichiometricParameters =
            serde_json::from_str(r#"{"y_ac": 0.04}"#).unwrap();
        assert_eq!(params.y_ac, 0.04);
        assert_eq!(params.y_h2, 0.06);
    }
}
