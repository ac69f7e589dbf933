//! End-to-end runs of the six-phase pipeline over the reference
//! tomato catalog and small purpose-built catalogs.

use cf_algebra::Strength;
use diagnosis::{
    Catalog, DiagnosisError, DiagnosisSession, DiseaseImpact, DiseaseRuleSpec, NutrientStageBase,
    Role, SymptomRelation, SymptomReport,
};
use rule_engine::{EngineConfig, EngineError};

const EPS: f64 = 1e-9;

fn run(symptoms: &[SymptomReport], stage: Option<&str>) -> diagnosis::DiagnosisReport {
    let session = DiagnosisSession::new(&Catalog::tomato()).unwrap();
    session.diagnose(symptoms, stage).unwrap()
}

#[test]
fn test_early_blight_from_both_core_symptoms() {
    let report = run(
        &[
            SymptomReport::new("brown-leaf-spots", 0.85),
            SymptomReport::new("yellow-halos", 0.85),
        ],
        None,
    );
    assert_eq!(report.disease.name, "early-blight");
    assert!((report.disease.cf - 0.765).abs() < EPS);
    assert_eq!(report.disease.confidence_level(), "High");
    // No growth stage and no nutrient evidence: sentinel nutrient
    assert!(report.nutrient.is_none());
    assert_eq!(report.nutrient.cf, 0.0);
}

#[test]
fn test_single_symptom_septoria_uses_weak_rule() {
    let report = run(&[SymptomReport::new("small-gray-tan-spots", 0.85)], None);
    assert_eq!(report.disease.name, "septoria-leaf-spot");
    assert!((report.disease.cf - 0.3825).abs() < EPS);
    // Exactly one conclusion; the weak rule's result is never
    // overwritten by a later firing
    assert_eq!(report.all_diseases.len(), 1);
}

#[test]
fn test_full_presentation_septoria_uses_strong_rule() {
    let report = run(
        &[
            SymptomReport::new("small-gray-tan-spots", 0.85),
            SymptomReport::new("dark-speckled-centers", 0.85),
        ],
        None,
    );
    assert_eq!(report.disease.name, "septoria-leaf-spot");
    assert!((report.disease.cf - 0.765).abs() < EPS);
    assert_eq!(report.all_diseases.len(), 1);
}

#[test]
fn test_support_only_disease_accumulates_via_prob_or() {
    let report = run(
        &[
            SymptomReport::new("leaf-mottling", 1.0),
            SymptomReport::new("leaf-distortion", 1.0),
        ],
        None,
    );
    assert_eq!(report.disease.name, "mosaic-virus");
    // Each contribution is 0.70 * min(1.0, 0.70) = 0.49
    assert!((report.disease.cf - 0.7399).abs() < EPS);
}

#[test]
fn test_any_of_gate_admits_bacterial_spot() {
    let report = run(
        &[
            SymptomReport::new("small-dark-spots", 1.0),
            SymptomReport::new("leaf-yellowing", 1.0),
        ],
        None,
    );
    assert_eq!(report.disease.name, "bacterial-spot");
    // Gate symptom admits the rule; CF comes from the core pair only
    assert!((report.disease.cf - 0.585).abs() < EPS);
    assert_eq!(report.all_diseases.len(), 1);
}

#[test]
fn test_core_without_gate_does_not_conclude() {
    let report = run(&[SymptomReport::new("small-dark-spots", 1.0)], None);
    assert!(report
        .all_diseases
        .iter()
        .all(|c| c.name != "bacterial-spot"));
}

#[test]
fn test_duplicate_reports_merge_before_diagnosis() {
    let report = run(
        &[
            SymptomReport::new("small-gray-tan-spots", 0.5),
            SymptomReport::new("small-gray-tan-spots", 0.5),
        ],
        None,
    );
    // Intake merges to prob_or(0.5, 0.5) = 0.75, then the weak rule
    // scales min(0.75, 0.85) by 0.45
    assert_eq!(report.disease.name, "septoria-leaf-spot");
    assert!((report.disease.cf - 0.3375).abs() < EPS);
}

#[test]
fn test_stage_alone_yields_base_nutrient() {
    let report = run(&[], Some("fruiting"));
    assert!(report.disease.is_none());
    assert_eq!(report.nutrient.name, "potassium");
    assert!((report.nutrient.cf - 0.90).abs() < EPS);
}

#[test]
fn test_symptom_evidence_caps_nutrient_cf() {
    let report = run(&[SymptomReport::new("leaf-edge-browning", 0.8)], Some("fruiting"));
    assert_eq!(report.nutrient.name, "potassium");
    // min(base 0.90, adjusted 0.90, evidence min(0.8, 0.9))
    assert!((report.nutrient.cf - 0.8).abs() < EPS);
}

#[test]
fn test_evidence_only_nutrient_without_stage_base() {
    let report = run(&[SymptomReport::new("interveinal-yellowing", 0.9)], None);
    // Magnesium has no stage row anywhere; it is seeded from
    // evidence with base 1.0 and scored on evidence alone
    assert_eq!(report.nutrient.name, "magnesium");
    assert!((report.nutrient.cf - 0.85).abs() < EPS);
    let potassium = report
        .all_nutrients
        .iter()
        .find(|c| c.name == "potassium")
        .unwrap();
    assert!((potassium.cf - 0.6).abs() < EPS);
}

#[test]
fn test_empty_input_yields_both_sentinels() {
    let report = run(&[], None);
    assert!(report.disease.is_none());
    assert!(report.nutrient.is_none());
    assert_eq!(report.disease.cf, 0.0);
    assert_eq!(report.nutrient.cf, 0.0);
    assert!(report.adjustments.is_empty());
}

#[test]
fn test_trace_records_every_firing_in_order() {
    let report = run(&[], None);
    assert_eq!(report.rules_fired, report.trace.len());
    // All six advance rules fire even on empty input
    for name in [
        "advance-intake",
        "advance-primary-diagnosis",
        "advance-cross-domain-adjustment",
        "advance-secondary-diagnosis",
        "advance-conflict-resolution",
        "advance-output",
    ] {
        assert!(report.trace.iter().any(|t| t == name), "missing {name}");
    }
}

/// Minimal catalog where one confident disease depresses a nutrient's
/// stage base through an impact factor.
fn wilt_catalog() -> Catalog {
    Catalog {
        disease_rules: vec![DiseaseRuleSpec {
            disease: "wilt-disease".to_string(),
            strength: Strength::Strong,
            core: vec!["wilt-sign".to_string()],
            any_of: vec![],
        }],
        symptom_relations: vec![SymptomRelation {
            disease: "wilt-disease".to_string(),
            symptom: "wilt-sign".to_string(),
            role: Role::Core,
            cf: 0.9,
        }],
        impacts: vec![DiseaseImpact {
            disease: "wilt-disease".to_string(),
            nutrient: "nitrogen".to_string(),
            factor: 0.7,
        }],
        stage_bases: vec![NutrientStageBase {
            nutrient: "nitrogen".to_string(),
            stage: "vegetative".to_string(),
            cf: 0.85,
        }],
        nutrient_relations: vec![],
    }
}

#[test]
fn test_cross_domain_adjustment_depresses_nutrient() {
    let session = DiagnosisSession::new(&wilt_catalog()).unwrap();
    let report = session
        .diagnose(&[SymptomReport::new("wilt-sign", 0.9)], Some("vegetative"))
        .unwrap();

    // Disease 0.9 * min(0.9, 0.9) = 0.81 clears the impact threshold
    assert_eq!(report.disease.name, "wilt-disease");
    assert!((report.disease.cf - 0.81).abs() < EPS);

    // Nitrogen: min(base 0.85, 0.85 * 0.7) with no symptom evidence
    assert_eq!(report.nutrient.name, "nitrogen");
    assert!((report.nutrient.cf - 0.595).abs() < EPS);

    assert_eq!(report.adjustments.len(), 1);
    assert_eq!(report.adjustments[0].disease, "wilt-disease");
    assert_eq!(report.adjustments[0].nutrient, "nitrogen");
    assert!((report.adjustments[0].factor - 0.7).abs() < EPS);
}

#[test]
fn test_below_threshold_disease_leaves_nutrient_unadjusted() {
    let mut catalog = wilt_catalog();
    catalog.disease_rules[0].strength = Strength::Weak;
    let session = DiagnosisSession::new(&catalog).unwrap();
    let report = session
        .diagnose(&[SymptomReport::new("wilt-sign", 0.9)], Some("vegetative"))
        .unwrap();

    // 0.45 * 0.9 = 0.405 stays below the 0.7 impact threshold
    assert!((report.disease.cf - 0.405).abs() < EPS);
    assert!(report.adjustments.is_empty());
    assert!((report.nutrient.cf - 0.85).abs() < EPS);
}

/// Catalog where two diseases conclude at exactly the same CF from
/// the same symptom.
fn shared_sign_catalog() -> Catalog {
    Catalog {
        disease_rules: vec![
            DiseaseRuleSpec {
                disease: "first-listed".to_string(),
                strength: Strength::Strong,
                core: vec!["shared-sign".to_string()],
                any_of: vec![],
            },
            DiseaseRuleSpec {
                disease: "second-listed".to_string(),
                strength: Strength::Strong,
                core: vec!["shared-sign".to_string()],
                any_of: vec![],
            },
        ],
        symptom_relations: vec![
            SymptomRelation {
                disease: "first-listed".to_string(),
                symptom: "shared-sign".to_string(),
                role: Role::Core,
                cf: 0.8,
            },
            SymptomRelation {
                disease: "second-listed".to_string(),
                symptom: "shared-sign".to_string(),
                role: Role::Core,
                cf: 0.8,
            },
        ],
        impacts: vec![],
        stage_bases: vec![],
        nutrient_relations: vec![],
    }
}

#[test]
fn test_equal_confidence_tie_resolves_by_creation_order() {
    let session = DiagnosisSession::new(&shared_sign_catalog()).unwrap();
    let report = session
        .diagnose(&[SymptomReport::new("shared-sign", 1.0)], None)
        .unwrap();

    assert_eq!(report.all_diseases.len(), 2);
    assert!((report.all_diseases[0].cf - report.all_diseases[1].cf).abs() < EPS);
    // Deterministic winner: the conclusion asserted first
    assert_eq!(report.disease.name, "first-listed");
}

/// Engine wired by hand so working memory stays inspectable after
/// quiescence.
fn engine_for(catalog: &Catalog) -> rule_engine::Engine {
    use std::collections::BTreeMap;

    let mut engine = rule_engine::Engine::new(EngineConfig::default());
    diagnosis::register_templates(engine.store_mut()).unwrap();
    for rel in &catalog.symptom_relations {
        engine
            .store_mut()
            .assert_fact(
                "disease-symptom-relation",
                BTreeMap::from([
                    ("disease".to_string(), fact_store::Value::symbol(&rel.disease)),
                    ("symptom".to_string(), fact_store::Value::symbol(&rel.symptom)),
                    ("role".to_string(), fact_store::Value::symbol(rel.role.as_str())),
                    ("cf".to_string(), fact_store::Value::Float(rel.cf)),
                ]),
            )
            .unwrap();
    }
    engine.load_rules(diagnosis::build_rules(catalog)).unwrap();
    engine
        .store_mut()
        .assert_fact(
            "phase-marker",
            BTreeMap::from([("name".to_string(), fact_store::Value::symbol("intake"))]),
        )
        .unwrap();
    engine.push_focus(diagnosis::phase::INTAKE);
    engine
}

#[test]
fn test_quiescent_store_holds_one_final_fact_per_category() {
    use std::collections::BTreeMap;

    // Equal-CF tie: both winner activations are eligible, yet the
    // final-fact guard must keep the second from asserting a sibling
    let mut engine = engine_for(&shared_sign_catalog());
    engine
        .store_mut()
        .assert_fact(
            "symptom",
            BTreeMap::from([("name".to_string(), fact_store::Value::symbol("shared-sign"))]),
        )
        .unwrap();
    engine.run().unwrap();

    assert_eq!(engine.store().facts_of("disease").count(), 2);
    assert_eq!(engine.store().facts_of("final-disease").count(), 1);
    assert_eq!(engine.store().facts_of("final-nutrient").count(), 1);
}

#[test]
fn test_quiescent_store_holds_one_sentinel_per_empty_category() {
    let mut engine = engine_for(&shared_sign_catalog());
    engine.run().unwrap();

    assert_eq!(engine.store().facts_of("disease").count(), 0);
    assert_eq!(engine.store().facts_of("final-disease").count(), 1);
    assert_eq!(engine.store().facts_of("final-nutrient").count(), 1);
}

#[test]
fn test_report_serializes_to_json() {
    let report = run(&[SymptomReport::new("small-gray-tan-spots", 0.85)], None);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["disease"]["name"], "septoria-leaf-spot");
    assert!(json["trace"].as_array().is_some_and(|t| !t.is_empty()));
}

#[test]
fn test_exhausted_cycle_budget_is_terminal() {
    let session =
        DiagnosisSession::with_config(&Catalog::tomato(), EngineConfig { max_firings: 3 })
            .unwrap();
    let err = session.diagnose(&[], None).unwrap_err();
    assert!(matches!(
        err,
        DiagnosisError::Engine(EngineError::BudgetExceeded { fired: 3 })
    ));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    const SYMPTOMS: [&str; 18] = [
        "brown-leaf-spots",
        "yellow-halos",
        "bulls-eye-pattern",
        "small-gray-tan-spots",
        "dark-speckled-centers",
        "lower-leaf-yellowing",
        "plant-wilting",
        "bottom-up-collapse",
        "small-dark-spots",
        "leaf-yellowing",
        "leaf-drop",
        "leaf-mottling",
        "leaf-distortion",
        "pale-green-leaves",
        "stunted-growth",
        "leaf-edge-browning",
        "interveinal-yellowing",
        "blossom-end-rot",
    ];

    const STAGES: [&str; 4] = ["seedling", "vegetative", "flowering", "fruiting"];

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Any observation set reaches quiescence with exactly one
        // bounded conclusion per category.
        #[test]
        fn any_input_quiesces_with_one_final_per_category(
            picks in prop::collection::vec((0usize..SYMPTOMS.len(), 0.0f64..=1.0), 0..6),
            stage in proptest::option::of(0usize..STAGES.len()),
        ) {
            let symptoms: Vec<SymptomReport> = picks
                .iter()
                .map(|&(i, cf)| SymptomReport::new(SYMPTOMS[i], cf))
                .collect();

            let session = DiagnosisSession::new(&Catalog::tomato()).unwrap();
            let report = session
                .diagnose(&symptoms, stage.map(|i| STAGES[i]))
                .unwrap();

            prop_assert!((-1.0..=1.0).contains(&report.disease.cf));
            prop_assert!((-1.0..=1.0).contains(&report.nutrient.cf));
            prop_assert_eq!(report.rules_fired, report.trace.len());
            for conclusion in report.all_diseases.iter().chain(&report.all_nutrients) {
                prop_assert!((-1.0..=1.0).contains(&conclusion.cf));
            }
            if report.disease.is_none() {
                prop_assert_eq!(report.disease.cf, 0.0);
            }
        }
    }
}
