//! Diagnosis Session API
//!
//! The external surface: validate a catalog once, load it into a
//! fresh engine, run one set of observations to quiescence, and
//! extract a ranked report. A session is consumed by `diagnose`, so
//! independent runs always start from a fresh engine.

use crate::templates::{register_templates, template};
use crate::{build_rules, phase, Catalog, CatalogError, NONE_CONCLUSION};
use cf_algebra::confidence_level;
use fact_store::{Fact, FactStore, StoreError, Value};
use rule_engine::{Engine, EngineConfig, EngineError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

/// Errors surfaced by the session API
#[derive(Debug, Error)]
pub enum DiagnosisError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A conclusion fact lacked an expected slot; indicates a
    /// template/rule mismatch, not bad input
    #[error("conclusion fact missing slot '{0}'")]
    MalformedConclusion(&'static str),

    /// Quiescence reached without a final conclusion in a category
    #[error("no final {0} conclusion at quiescence")]
    MissingConclusion(&'static str),
}

/// Reported severity of an observed symptom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    #[default]
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

/// One observed symptom with the reporter's certainty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomReport {
    pub name: String,
    pub severity: Severity,
    pub cf: f64,
}

impl SymptomReport {
    pub fn new(name: impl Into<String>, cf: f64) -> Self {
        Self {
            name: name.into(),
            severity: Severity::default(),
            cf,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// A named conclusion with its certainty and explanation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conclusion {
    pub name: String,
    pub cf: f64,
    pub explanation: String,
}

impl Conclusion {
    /// Human-readable confidence label for the CF
    pub fn confidence_level(&self) -> &'static str {
        confidence_level(self.cf)
    }

    /// True for the sentinel asserted when no candidate reached the
    /// minimum confidence
    pub fn is_none(&self) -> bool {
        self.name == NONE_CONCLUSION
    }
}

/// One cross-domain adjustment that was applied during the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adjustment {
    pub disease: String,
    pub nutrient: String,
    pub factor: f64,
}

/// Everything extracted from working memory at quiescence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisReport {
    /// Winning disease conclusion (sentinel when none qualified)
    pub disease: Conclusion,
    /// Winning nutrient conclusion (sentinel when none qualified)
    pub nutrient: Conclusion,
    /// All disease candidates, highest CF first
    pub all_diseases: Vec<Conclusion>,
    /// All nutrient candidates, highest CF first
    pub all_nutrients: Vec<Conclusion>,
    /// Cross-domain adjustments derived during the run
    pub adjustments: Vec<Adjustment>,
    /// Total rule firings
    pub rules_fired: usize,
    /// Rule names in firing order
    pub trace: Vec<String>,
}

/// One diagnosis run over a validated catalog
pub struct DiagnosisSession {
    engine: Engine,
}

impl DiagnosisSession {
    /// Validate the catalog, register the domain templates, assert
    /// the static relation tables, and load the generated rules.
    pub fn new(catalog: &Catalog) -> Result<Self, DiagnosisError> {
        Self::with_config(catalog, EngineConfig::default())
    }

    pub fn with_config(catalog: &Catalog, config: EngineConfig) -> Result<Self, DiagnosisError> {
        catalog.validate()?;
        let mut engine = Engine::new(config);
        register_templates(engine.store_mut())?;
        assert_static_facts(engine.store_mut(), catalog)?;
        engine.load_rules(build_rules(catalog))?;
        Ok(Self { engine })
    }

    /// Assert the observations, run the pipeline to quiescence, and
    /// extract the report. Consumes the session: every run starts
    /// from fresh working memory.
    pub fn diagnose(
        mut self,
        symptoms: &[SymptomReport],
        growth_stage: Option<&str>,
    ) -> Result<DiagnosisReport, DiagnosisError> {
        info!(
            symptoms = symptoms.len(),
            stage = growth_stage.unwrap_or("unknown"),
            "diagnosis run starting"
        );

        for symptom in symptoms {
            self.engine.store_mut().assert_fact(
                template::SYMPTOM,
                BTreeMap::from([
                    ("name".to_string(), Value::symbol(&symptom.name)),
                    ("severity".to_string(), Value::symbol(symptom.severity.as_str())),
                    ("cf".to_string(), Value::Float(symptom.cf)),
                ]),
            )?;
        }
        if let Some(stage) = growth_stage {
            self.engine.store_mut().assert_fact(
                template::GROWTH_STAGE,
                BTreeMap::from([("name".to_string(), Value::symbol(stage))]),
            )?;
        }
        self.engine.store_mut().assert_fact(
            template::PHASE_MARKER,
            BTreeMap::from([("name".to_string(), Value::symbol(phase::INTAKE))]),
        )?;
        self.engine.push_focus(phase::INTAKE);

        let summary = self.engine.run()?;
        let store = self.engine.store();

        let disease = single_final(store, template::FINAL_DISEASE, "disease")?;
        let nutrient = single_final(store, template::FINAL_NUTRIENT, "nutrient")?;
        let all_diseases = ranked_conclusions(store, template::DISEASE)?;
        let all_nutrients = ranked_conclusions(store, template::NUTRIENT)?;
        let adjustments = applied_adjustments(store)?;

        info!(
            disease = %disease.name,
            nutrient = %nutrient.name,
            firings = summary.firings,
            "diagnosis run complete"
        );

        Ok(DiagnosisReport {
            disease,
            nutrient,
            all_diseases,
            all_nutrients,
            adjustments,
            rules_fired: summary.firings,
            trace: summary.trace,
        })
    }
}

fn assert_static_facts(store: &mut FactStore, catalog: &Catalog) -> Result<(), StoreError> {
    for rel in &catalog.symptom_relations {
        store.assert_fact(
            template::DISEASE_RELATION,
            BTreeMap::from([
                ("disease".to_string(), Value::symbol(&rel.disease)),
                ("symptom".to_string(), Value::symbol(&rel.symptom)),
                ("role".to_string(), Value::symbol(rel.role.as_str())),
                ("cf".to_string(), Value::Float(rel.cf)),
            ]),
        )?;
    }
    for impact in &catalog.impacts {
        store.assert_fact(
            template::DISEASE_IMPACT,
            BTreeMap::from([
                ("disease".to_string(), Value::symbol(&impact.disease)),
                ("nutrient".to_string(), Value::symbol(&impact.nutrient)),
                ("factor".to_string(), Value::Float(impact.factor)),
            ]),
        )?;
    }
    for base in &catalog.stage_bases {
        store.assert_fact(
            template::NUTRIENT_STAGE_BASE,
            BTreeMap::from([
                ("nutrient".to_string(), Value::symbol(&base.nutrient)),
                ("stage".to_string(), Value::symbol(&base.stage)),
                ("cf".to_string(), Value::Float(base.cf)),
            ]),
        )?;
    }
    for rel in &catalog.nutrient_relations {
        store.assert_fact(
            template::NUTRIENT_RELATION,
            BTreeMap::from([
                ("nutrient".to_string(), Value::symbol(&rel.nutrient)),
                ("symptom".to_string(), Value::symbol(&rel.symptom)),
                ("cf".to_string(), Value::Float(rel.cf)),
            ]),
        )?;
    }
    Ok(())
}

fn conclusion_from(fact: &Fact) -> Result<Conclusion, DiagnosisError> {
    let name = fact
        .get("name")
        .and_then(Value::as_symbol)
        .ok_or(DiagnosisError::MalformedConclusion("name"))?;
    let cf = fact
        .get("cf")
        .and_then(Value::as_f64)
        .ok_or(DiagnosisError::MalformedConclusion("cf"))?;
    let explanation = fact
        .get("explanation")
        .and_then(Value::as_symbol)
        .ok_or(DiagnosisError::MalformedConclusion("explanation"))?;
    Ok(Conclusion {
        name: name.to_string(),
        cf,
        explanation: explanation.to_string(),
    })
}

fn single_final(
    store: &FactStore,
    template: &str,
    category: &'static str,
) -> Result<Conclusion, DiagnosisError> {
    let fact = store
        .facts_of(template)
        .next()
        .ok_or(DiagnosisError::MissingConclusion(category))?;
    conclusion_from(fact)
}

fn ranked_conclusions(store: &FactStore, template: &str) -> Result<Vec<Conclusion>, DiagnosisError> {
    let mut out = store
        .facts_of(template)
        .map(conclusion_from)
        .collect::<Result<Vec<_>, _>>()?;
    out.sort_by(|a, b| b.cf.partial_cmp(&a.cf).unwrap_or(std::cmp::Ordering::Equal));
    Ok(out)
}

fn applied_adjustments(store: &FactStore) -> Result<Vec<Adjustment>, DiagnosisError> {
    store
        .facts_of(template::CF_ADJUSTMENT)
        .map(|fact| {
            let disease = fact
                .get("disease")
                .and_then(Value::as_symbol)
                .ok_or(DiagnosisError::MalformedConclusion("disease"))?;
            let nutrient = fact
                .get("nutrient")
                .and_then(Value::as_symbol)
                .ok_or(DiagnosisError::MalformedConclusion("nutrient"))?;
            let factor = fact
                .get("factor")
                .and_then(Value::as_f64)
                .ok_or(DiagnosisError::MalformedConclusion("factor"))?;
            Ok(Adjustment {
                disease: disease.to_string(),
                nutrient: nutrient.to_string(),
                factor,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_algebra::Strength;
    use crate::DiseaseRuleSpec;

    #[test]
    fn test_invalid_catalog_rejected_before_any_run() {
        let mut catalog = Catalog::tomato();
        catalog.disease_rules.push(DiseaseRuleSpec {
            disease: "phantom".to_string(),
            strength: Strength::Weak,
            core: vec!["unseen".to_string()],
            any_of: vec![],
        });
        assert!(matches!(
            DiagnosisSession::new(&catalog),
            Err(DiagnosisError::Catalog(_))
        ));
    }

    #[test]
    fn test_symptom_report_builder() {
        let report = SymptomReport::new("plant-wilting", 0.8).with_severity(Severity::Severe);
        assert_eq!(report.severity.as_str(), "severe");
        assert_eq!(report.cf, 0.8);
    }

    #[test]
    fn test_sentinel_conclusion_detection() {
        let sentinel = Conclusion {
            name: NONE_CONCLUSION.to_string(),
            cf: 0.0,
            explanation: String::new(),
        };
        assert!(sentinel.is_none());
        assert_eq!(sentinel.confidence_level(), "Very Low");
    }
}
