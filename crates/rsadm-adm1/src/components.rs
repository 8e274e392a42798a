//! Component registry of the extended ADM1 network.
//!
//! Organic species are measured as COD (kg COD/m³), inorganic pools in kmol of
//! their defining element per m³ and minerals in kg of formula unit per m³.
//! Elemental contents of organic species come from [`StoichiometricParameters`];
//! mineral contents and COD are derived from the ions they bind, so precipitation
//! conserves every tracked quantity.

use crate::model::ModelOptions;
use crate::parameters::{Adm1Parameters, MineralDefinition, StoichiometricParameters};
use rsadm_core::component::{
    Basis, Component, ComponentRegistry, ElementalContent, MeasuredAs, PhaseClass,
};
use rsadm_core::errors::AdmResult;

/// kg COD per kmol of sulfide sulfur (oxidation to sulfate)
pub const COD_PER_KMOL_SULFIDE: f64 = 64.0;
/// kg COD per kmol of elemental sulfur
pub const COD_PER_KMOL_SULFUR: f64 = 48.0;
/// kg COD per kmol of ferrous iron (one electron relative to ferric)
pub const COD_PER_KMOL_FERROUS: f64 = 8.0;

const M_C: f64 = 12.011;
const M_N: f64 = 14.007;
const M_P: f64 = 30.974;
const M_S: f64 = 32.06;
const M_FE: f64 = 55.845;

/// Organic species from its molar mass and oxygen demand per kmol
fn organic(id: &str, class: PhaseClass, molar_mass: f64, cod_per_kmol: f64) -> Component {
    Component::organic(id, class, molar_mass, cod_per_kmol / molar_mass)
}

fn biomass(id: &str, s: &StoichiometricParameters, description: &str) -> Component {
    // C5H7NO2
    organic(id, PhaseClass::Particulate, 113.11, 160.0)
        .with_content(ElementalContent::new(s.c_bac, s.n_bac, s.p_bac))
        .with_description(description)
}

fn acid(id: &str, molar_mass: f64, cod_per_kmol: f64, carbon: f64, description: &str) -> Component {
    organic(id, PhaseClass::Soluble, molar_mass, cod_per_kmol)
        .with_charge(-1)
        .with_content(ElementalContent::new(carbon, 0.0, 0.0))
        .with_description(description)
}

/// Mineral component with COD and elemental content carried over from its ions.
pub fn mineral_component(
    definition: &MineralDefinition,
    registry: &ComponentRegistry,
) -> AdmResult<Component> {
    let mut cod_per_kmol = 0.0;
    let mut content = ElementalContent::default();
    for ion in &definition.ions {
        if let Some(id) = &ion.component {
            let source = registry.get(id)?;
            cod_per_kmol += ion.power * source.cod_factor();
            content.carbon += ion.power * source.content.carbon;
            content.nitrogen += ion.power * source.content.nitrogen;
            content.phosphorus += ion.power * source.content.phosphorus;
        }
    }
    let m = definition.molar_mass;
    Ok(Component::mineral(&definition.id, m)
        .with_cod(cod_per_kmol / m)
        .with_content(ElementalContent::new(
            content.carbon / m,
            content.nitrogen / m,
            content.phosphorus / m,
        ))
        .with_description(&definition.name))
}

/// Build the registry for the enabled process groups.
///
/// Liquid components come first in a fixed order; the gas components follow.
pub fn registry(params: &Adm1Parameters, options: &ModelOptions) -> AdmResult<ComponentRegistry> {
    let s = &params.stoichiometry;
    let mut registry = ComponentRegistry::new();

    let soluble = [
        organic("S_su", PhaseClass::Soluble, 180.16, 192.0)
            .with_content(ElementalContent::new(s.c_su, 0.0, 0.0))
            .with_description("monosaccharides"),
        organic("S_aa", PhaseClass::Soluble, 110.0, 165.0)
            .with_content(ElementalContent::new(s.c_aa, s.n_aa, 0.0))
            .with_description("amino acids"),
        organic("S_fa", PhaseClass::Soluble, 256.42, 736.0)
            .with_content(ElementalContent::new(s.c_fa, 0.0, 0.0))
            .with_description("long chain fatty acids"),
        acid("S_va", 102.13, 208.0, s.c_va, "total valerate"),
        acid("S_bu", 88.11, 160.0, s.c_bu, "total butyrate"),
        acid("S_pro", 74.08, 112.0, s.c_pro, "total propionate"),
        acid("S_ac", 60.05, 64.0, s.c_ac, "total acetate"),
        organic("S_h2", PhaseClass::Soluble, 2.016, 16.0).with_description("dissolved hydrogen"),
        organic("S_ch4", PhaseClass::Soluble, 16.04, 64.0)
            .with_content(ElementalContent::new(s.c_ch4, 0.0, 0.0))
            .with_description("dissolved methane"),
        Component::ion("S_IC", "C", M_C, -1)
            .with_content(ElementalContent::new(1.0, 0.0, 0.0))
            .with_description("inorganic carbon"),
        Component::ion("S_IN", "N", M_N, 1)
            .with_content(ElementalContent::new(0.0, 1.0, 0.0))
            .with_description("inorganic nitrogen"),
        organic("S_I", PhaseClass::Soluble, 113.11, 160.0)
            .with_content(ElementalContent::new(s.c_si, s.n_i, s.p_i))
            .with_description("soluble inerts"),
    ];
    let particulate = [
        organic("X_c", PhaseClass::Particulate, 113.11, 160.0)
            .with_content(ElementalContent::new(s.c_xc, s.n_xc, s.p_xc))
            .with_description("composites"),
        organic("X_ch", PhaseClass::Particulate, 162.14, 192.0)
            .with_content(ElementalContent::new(s.c_ch, 0.0, 0.0))
            .with_description("carbohydrates"),
        organic("X_pr", PhaseClass::Particulate, 110.0, 165.0)
            .with_content(ElementalContent::new(s.c_pr, s.n_aa, 0.0))
            .with_description("proteins"),
        organic("X_li", PhaseClass::Particulate, 885.4, 2576.0)
            .with_content(ElementalContent::new(s.c_li, 0.0, s.p_li))
            .with_description("lipids"),
        biomass("X_su", s, "sugar degraders"),
        biomass("X_aa", s, "amino acid degraders"),
        biomass("X_fa", s, "LCFA degraders"),
        biomass("X_c4", s, "valerate and butyrate degraders"),
        biomass("X_pro", s, "propionate degraders"),
        biomass("X_ac", s, "acetoclastic methanogens"),
        biomass("X_h2", s, "hydrogenotrophic methanogens"),
        organic("X_I", PhaseClass::Particulate, 113.11, 160.0)
            .with_content(ElementalContent::new(s.c_xi, s.n_i, s.p_i))
            .with_description("particulate inerts"),
    ];
    let ions = [
        Component::ion("S_Na", "Na", 22.99, 1).with_description("sodium"),
        Component::ion("S_K", "K", 39.098, 1).with_description("potassium"),
        Component::ion("S_Cl", "Cl", 35.45, -1).with_description("chloride"),
        Component::ion("S_Ca", "Ca", 40.078, 2).with_description("calcium"),
        Component::ion("S_Mg", "Mg", 24.305, 2).with_description("magnesium"),
        Component::ion("S_IP", "P", M_P, -2)
            .with_content(ElementalContent::new(0.0, 0.0, 1.0))
            .with_description("inorganic phosphorus"),
        Component::ion("S_SO4", "S", M_S, -2).with_description("sulfate"),
        Component::ion("S_IS", "S", M_S, -1)
            .with_cod(COD_PER_KMOL_SULFIDE / M_S)
            .with_description("total sulfide"),
        Component::ion("S_Fe2", "Fe", M_FE, 2)
            .with_cod(COD_PER_KMOL_FERROUS / M_FE)
            .with_description("ferrous iron"),
        Component::ion("S_Fe3", "Fe", M_FE, 3).with_description("ferric iron"),
        Component::ion("S_Al", "Al", 26.98, 3).with_description("aluminium"),
    ];
    for component in soluble.into_iter().chain(particulate).chain(ions) {
        registry.register(component)?;
    }

    if options.phosphorus {
        let p = &params.phosphorus;
        registry.register(biomass("X_PAO", s, "phosphorus-accumulating organisms"))?;
        registry.register(
            Component::new(
                "X_PP",
                PhaseClass::Particulate,
                MeasuredAs::Element("P".to_string()),
                Basis::Molar,
                M_P,
            )
            .with_content(ElementalContent::new(0.0, 0.0, 1.0))
            .with_description("polyphosphate"),
        )?;
        registry.register(
            organic("X_PHA", PhaseClass::Particulate, 86.09, 144.0)
                .with_content(ElementalContent::new(p.c_pha, 0.0, 0.0))
                .with_description("polyhydroxyalkanoates"),
        )?;
    }
    if options.sulfur {
        registry.register(biomass("X_hSRB", s, "hydrogenotrophic sulfate reducers"))?;
        registry.register(biomass("X_aSRB", s, "acetotrophic sulfate reducers"))?;
        registry.register(biomass("X_pSRB", s, "propionate-degrading sulfate reducers"))?;
        registry.register(biomass("X_c4SRB", s, "butyrate and valerate sulfate reducers"))?;
    }
    if options.iron {
        registry.register(
            Component::new(
                "X_S0",
                PhaseClass::Particulate,
                MeasuredAs::Element("S".to_string()),
                Basis::Molar,
                M_S,
            )
            .with_cod(COD_PER_KMOL_SULFUR / M_S)
            .with_description("elemental sulfur"),
        )?;
    }
    if options.minerals {
        for definition in &params.minerals.minerals {
            let component = mineral_component(definition, &registry)?;
            registry.register(component)?;
        }
    }

    registry.register(
        organic("G_h2", PhaseClass::Gas, 2.016, 16.0).with_description("hydrogen in the headspace"),
    )?;
    registry.register(
        organic("G_ch4", PhaseClass::Gas, 16.04, 64.0)
            .with_content(ElementalContent::new(s.c_ch4, 0.0, 0.0))
            .with_description("methane in the headspace"),
    )?;
    registry.register(
        Component::new(
            "G_co2",
            PhaseClass::Gas,
            MeasuredAs::Element("C".to_string()),
            Basis::Molar,
            M_C,
        )
        .with_content(ElementalContent::new(1.0, 0.0, 0.0))
        .with_description("carbon dioxide in the headspace"),
    )?;
    if options.h2s_stripping {
        registry.register(
            Component::new(
                "G_h2s",
                PhaseClass::Gas,
                MeasuredAs::Element("S".to_string()),
                Basis::Molar,
                M_S,
            )
            .with_cod(COD_PER_KMOL_SULFIDE / M_S)
            .with_description("hydrogen sulfide in the headspace"),
        )?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rsadm_core::process::Conserved;

    #[test]
    fn test_acid_molar_factors_match_bsm2() {
        let registry = registry(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
        assert_relative_eq!(registry.get("S_ac").unwrap().molar_factor(), 1.0 / 64.0);
        assert_relative_eq!(registry.get("S_va").unwrap().molar_factor(), 1.0 / 208.0);
        assert_relative_eq!(registry.get("S_IS").unwrap().cod_factor(), 64.0, epsilon = 1e-9);
    }

    #[test]
    fn test_optional_groups_follow_options() {
        let params = Adm1Parameters::default();
        let full = registry(&params, &ModelOptions::default()).unwrap();
        let core = registry(&params, &ModelOptions::core()).unwrap();
        assert!(full.contains("X_PAO") && full.contains("X_hSRB") && full.contains("X_struv"));
        assert!(!core.contains("X_PAO") && !core.contains("X_hSRB") && !core.contains("X_struv"));
        assert_eq!(core.gas_ids(), vec!["G_h2", "G_ch4", "G_co2"]);
        assert_eq!(full.gas_ids().len(), 4);
    }

    #[test]
    fn test_struvite_carries_its_ions() {
        let registry = registry(&Adm1Parameters::default(), &ModelOptions::default()).unwrap();
        let struvite = registry.get("X_struv").unwrap();
        assert_relative_eq!(struvite.content.nitrogen, 1.0 / 245.41);
        assert_relative_eq!(struvite.content.phosphorus, 1.0 / 245.41);
        assert_eq!(Conserved::Cod.content(struvite), 0.0);

        let sulfide = registry.get("X_FeS").unwrap();
        assert_relative_eq!(
            Conserved::Cod.content(sulfide) * 87.91,
            COD_PER_KMOL_SULFIDE + COD_PER_KMOL_FERROUS,
            epsilon = 1e-9
        );
    }
}
