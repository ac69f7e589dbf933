//! Domain Fact Templates

use fact_store::{FactStore, FieldSpec, FieldType, StoreError, Template, Value};

/// Template names used across the rule catalog
pub mod template {
    pub const SYMPTOM: &str = "symptom";
    pub const GROWTH_STAGE: &str = "growth-stage";
    pub const PHASE_MARKER: &str = "phase-marker";

    pub const DISEASE_RELATION: &str = "disease-symptom-relation";
    pub const DISEASE_IMPACT: &str = "disease-nutrient-impact";
    pub const NUTRIENT_STAGE_BASE: &str = "nutrient-stage-base";
    pub const NUTRIENT_RELATION: &str = "nutrient-symptom-relation";

    pub const DISEASE: &str = "disease";
    pub const SUPPORT_ACCUM: &str = "support-accum";
    pub const SUPPORT_APPLIED: &str = "support-applied";
    pub const CF_ADJUSTMENT: &str = "cf-adjustment";
    pub const ADJUSTMENT_APPLIED: &str = "adjustment-applied";
    pub const NUTRIENT_HYPOTHESIS: &str = "nutrient-hypothesis";
    pub const NUTRIENT_EVIDENCE: &str = "nutrient-evidence";
    pub const EVIDENCE_APPLIED: &str = "evidence-applied";
    pub const NUTRIENT: &str = "nutrient";
    pub const FINAL_DISEASE: &str = "final-disease";
    pub const FINAL_NUTRIENT: &str = "final-nutrient";
}

fn symbol(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Symbol)
}

fn evidence_cf(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Float).bounded(0.0, 1.0)
}

fn conclusion_cf(name: &str) -> FieldSpec {
    FieldSpec::new(name, FieldType::Float).bounded(-1.0, 1.0)
}

/// Register every domain template with a fresh store.
///
/// Evidence CFs are declared in [0, 1], conclusion CFs in [-1, 1],
/// impact factors in [0.5, 1.5]; the store enforces these bounds on
/// every assert and update.
pub fn register_templates(store: &mut FactStore) -> Result<(), StoreError> {
    use template::*;

    let templates = vec![
        Template::new(
            SYMPTOM,
            vec![
                symbol("name"),
                symbol("severity").with_default(Value::symbol("moderate")),
                evidence_cf("cf").with_default(Value::Float(1.0)),
            ],
        )?,
        Template::new(GROWTH_STAGE, vec![symbol("name")])?,
        Template::new(PHASE_MARKER, vec![symbol("name")])?,
        Template::new(
            DISEASE_RELATION,
            vec![
                symbol("disease"),
                symbol("symptom"),
                symbol("role"),
                evidence_cf("cf"),
            ],
        )?,
        Template::new(
            DISEASE_IMPACT,
            vec![
                symbol("disease"),
                symbol("nutrient"),
                FieldSpec::new("factor", FieldType::Float).bounded(0.5, 1.5),
            ],
        )?,
        Template::new(
            NUTRIENT_STAGE_BASE,
            vec![symbol("nutrient"), symbol("stage"), evidence_cf("cf")],
        )?,
        Template::new(
            NUTRIENT_RELATION,
            vec![symbol("nutrient"), symbol("symptom"), evidence_cf("cf")],
        )?,
        Template::new(
            DISEASE,
            vec![
                symbol("name"),
                conclusion_cf("cf"),
                symbol("explanation"),
                FieldSpec::new("evidence", FieldType::List)
                    .with_default(Value::List(Vec::new())),
            ],
        )?,
        Template::new(SUPPORT_ACCUM, vec![symbol("disease"), evidence_cf("cf")])?,
        Template::new(SUPPORT_APPLIED, vec![symbol("disease"), symbol("symptom")])?,
        Template::new(
            CF_ADJUSTMENT,
            vec![
                symbol("disease"),
                symbol("nutrient"),
                FieldSpec::new("factor", FieldType::Float).bounded(0.5, 1.5),
            ],
        )?,
        Template::new(
            ADJUSTMENT_APPLIED,
            vec![symbol("disease"), symbol("nutrient")],
        )?,
        Template::new(
            NUTRIENT_HYPOTHESIS,
            vec![
                symbol("nutrient"),
                evidence_cf("base-cf"),
                conclusion_cf("adjusted-cf"),
            ],
        )?,
        Template::new(NUTRIENT_EVIDENCE, vec![symbol("nutrient"), evidence_cf("cf")])?,
        Template::new(EVIDENCE_APPLIED, vec![symbol("nutrient"), symbol("symptom")])?,
        Template::new(
            NUTRIENT,
            vec![symbol("name"), conclusion_cf("cf"), symbol("explanation")],
        )?,
        Template::new(
            FINAL_DISEASE,
            vec![symbol("name"), conclusion_cf("cf"), symbol("explanation")],
        )?,
        Template::new(
            FINAL_NUTRIENT,
            vec![symbol("name"), conclusion_cf("cf"), symbol("explanation")],
        )?,
    ];

    for template in templates {
        store.register_template(template)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_all_templates_register() {
        let mut store = FactStore::new();
        register_templates(&mut store).unwrap();
        assert!(store.template(template::SYMPTOM).is_some());
        assert!(store.template(template::FINAL_NUTRIENT).is_some());
    }

    #[test]
    fn test_symptom_defaults() {
        let mut store = FactStore::new();
        register_templates(&mut store).unwrap();
        let id = store
            .assert_fact(
                template::SYMPTOM,
                BTreeMap::from([("name".to_string(), Value::symbol("wilting"))]),
            )
            .unwrap();
        let fact = store.fact(id).unwrap();
        assert_eq!(fact.get("severity"), Some(&Value::symbol("moderate")));
        assert_eq!(fact.get("cf"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_impact_factor_bounds_enforced() {
        let mut store = FactStore::new();
        register_templates(&mut store).unwrap();
        let result = store.assert_fact(
            template::DISEASE_IMPACT,
            BTreeMap::from([
                ("disease".to_string(), Value::symbol("early-blight")),
                ("nutrient".to_string(), Value::symbol("calcium")),
                ("factor".to_string(), Value::Float(2.0)),
            ]),
        );
        assert!(result.is_err());
    }
}
