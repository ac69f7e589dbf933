//! Static Rule Catalog: Relation Tables and Disease Rule Specs
//!
//! Externally supplied configuration consumed by the engine. Loaded
//! and validated once before any run; malformed rows are rejected,
//! never clamped.

use cf_algebra::Strength;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain classification of evidence strength for a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Required evidence; all core symptoms must be observed
    Core,
    /// Corroborating evidence; contributes through probabilistic OR
    Support,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Core => "core",
            Role::Support => "support",
        }
    }
}

/// Literature-derived link between a disease and a symptom
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRelation {
    pub disease: String,
    pub symptom: String,
    pub role: Role,
    pub cf: f64,
}

/// A disease's influence on a nutrient-deficiency signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseImpact {
    pub disease: String,
    pub nutrient: String,
    pub factor: f64,
}

/// Base deficiency likelihood for a nutrient at a growth stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientStageBase {
    pub nutrient: String,
    pub stage: String,
    pub cf: f64,
}

/// Link between a nutrient deficiency and a symptom
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientRelation {
    pub nutrient: String,
    pub symptom: String,
    pub cf: f64,
}

/// One diagnostic rule over a disease's relations: every `core`
/// symptom must be observed, plus at least one of `any_of` when that
/// list is non-empty. A disease with no core symptoms accumulates
/// its `any_of` contributions through probabilistic OR instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseRuleSpec {
    pub disease: String,
    pub strength: Strength,
    pub core: Vec<String>,
    pub any_of: Vec<String>,
}

/// Errors found while validating static configuration
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("relation {disease}/{symptom}: cf {cf} outside [0, 1]")]
    RelationCfOutOfRange {
        disease: String,
        symptom: String,
        cf: f64,
    },

    #[error("impact {disease}->{nutrient}: factor {factor} outside [0.5, 1.5]")]
    ImpactFactorOutOfRange {
        disease: String,
        nutrient: String,
        factor: f64,
    },

    #[error("stage base {nutrient}@{stage}: cf {cf} outside [0, 1]")]
    StageBaseCfOutOfRange {
        nutrient: String,
        stage: String,
        cf: f64,
    },

    #[error("nutrient relation {nutrient}/{symptom}: cf {cf} outside [0, 1]")]
    NutrientCfOutOfRange {
        nutrient: String,
        symptom: String,
        cf: f64,
    },

    #[error("duplicate {table} row: {key}")]
    DuplicateRow { table: String, key: String },

    #[error("rule for '{disease}' references symptom '{symptom}' with no relation row")]
    MissingRelation { disease: String, symptom: String },

    #[error("rule for '{disease}' has neither core nor any-of symptoms")]
    EmptyRule { disease: String },
}

/// The complete static configuration for one diagnosis domain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub disease_rules: Vec<DiseaseRuleSpec>,
    pub symptom_relations: Vec<SymptomRelation>,
    pub impacts: Vec<DiseaseImpact>,
    pub stage_bases: Vec<NutrientStageBase>,
    pub nutrient_relations: Vec<NutrientRelation>,
}

impl Catalog {
    /// Validate every table before any run starts. Out-of-range
    /// values and duplicate rows are hard errors.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = std::collections::BTreeSet::new();
        for rel in &self.symptom_relations {
            if !(0.0..=1.0).contains(&rel.cf) {
                return Err(CatalogError::RelationCfOutOfRange {
                    disease: rel.disease.clone(),
                    symptom: rel.symptom.clone(),
                    cf: rel.cf,
                });
            }
            if !seen.insert(format!("{}/{}", rel.disease, rel.symptom)) {
                return Err(CatalogError::DuplicateRow {
                    table: "disease-symptom-relation".to_string(),
                    key: format!("{}/{}", rel.disease, rel.symptom),
                });
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        for impact in &self.impacts {
            if !(0.5..=1.5).contains(&impact.factor) {
                return Err(CatalogError::ImpactFactorOutOfRange {
                    disease: impact.disease.clone(),
                    nutrient: impact.nutrient.clone(),
                    factor: impact.factor,
                });
            }
            if !seen.insert(format!("{}/{}", impact.disease, impact.nutrient)) {
                return Err(CatalogError::DuplicateRow {
                    table: "disease-nutrient-impact".to_string(),
                    key: format!("{}/{}", impact.disease, impact.nutrient),
                });
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        for base in &self.stage_bases {
            if !(0.0..=1.0).contains(&base.cf) {
                return Err(CatalogError::StageBaseCfOutOfRange {
                    nutrient: base.nutrient.clone(),
                    stage: base.stage.clone(),
                    cf: base.cf,
                });
            }
            if !seen.insert(format!("{}@{}", base.nutrient, base.stage)) {
                return Err(CatalogError::DuplicateRow {
                    table: "nutrient-stage-base".to_string(),
                    key: format!("{}@{}", base.nutrient, base.stage),
                });
            }
        }

        let mut seen = std::collections::BTreeSet::new();
        for rel in &self.nutrient_relations {
            if !(0.0..=1.0).contains(&rel.cf) {
                return Err(CatalogError::NutrientCfOutOfRange {
                    nutrient: rel.nutrient.clone(),
                    symptom: rel.symptom.clone(),
                    cf: rel.cf,
                });
            }
            if !seen.insert(format!("{}/{}", rel.nutrient, rel.symptom)) {
                return Err(CatalogError::DuplicateRow {
                    table: "nutrient-symptom-relation".to_string(),
                    key: format!("{}/{}", rel.nutrient, rel.symptom),
                });
            }
        }

        for rule in &self.disease_rules {
            if rule.core.is_empty() && rule.any_of.is_empty() {
                return Err(CatalogError::EmptyRule {
                    disease: rule.disease.clone(),
                });
            }
            for symptom in rule.core.iter().chain(&rule.any_of) {
                let known = self
                    .symptom_relations
                    .iter()
                    .any(|r| r.disease == rule.disease && &r.symptom == symptom);
                if !known {
                    return Err(CatalogError::MissingRelation {
                        disease: rule.disease.clone(),
                        symptom: symptom.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Relation CF for a (disease, symptom) pair
    pub fn relation_cf(&self, disease: &str, symptom: &str) -> Option<f64> {
        self.symptom_relations
            .iter()
            .find(|r| r.disease == disease && r.symptom == symptom)
            .map(|r| r.cf)
    }

    /// The tomato reference catalog: disease and nutrient relations
    /// with literature-derived certainty factors.
    pub fn tomato() -> Self {
        fn relation(disease: &str, symptom: &str, role: Role, cf: f64) -> SymptomRelation {
            SymptomRelation {
                disease: disease.to_string(),
                symptom: symptom.to_string(),
                role,
                cf,
            }
        }
        fn rule(disease: &str, strength: Strength, core: &[&str], any_of: &[&str]) -> DiseaseRuleSpec {
            DiseaseRuleSpec {
                disease: disease.to_string(),
                strength,
                core: core.iter().map(|s| s.to_string()).collect(),
                any_of: any_of.iter().map(|s| s.to_string()).collect(),
            }
        }
        fn base(nutrient: &str, stage: &str, cf: f64) -> NutrientStageBase {
            NutrientStageBase {
                nutrient: nutrient.to_string(),
                stage: stage.to_string(),
                cf,
            }
        }
        fn nutrient_rel(nutrient: &str, symptom: &str, cf: f64) -> NutrientRelation {
            NutrientRelation {
                nutrient: nutrient.to_string(),
                symptom: symptom.to_string(),
                cf,
            }
        }
        fn impact(disease: &str, nutrient: &str, factor: f64) -> DiseaseImpact {
            DiseaseImpact {
                disease: disease.to_string(),
                nutrient: nutrient.to_string(),
                factor,
            }
        }

        Catalog {
            disease_rules: vec![
                rule(
                    "early-blight",
                    Strength::Strong,
                    &["brown-leaf-spots", "yellow-halos"],
                    &[],
                ),
                // Stronger septoria presentation first; the weak
                // single-symptom rule is guarded against overwriting
                rule(
                    "septoria-leaf-spot",
                    Strength::Strong,
                    &["small-gray-tan-spots", "dark-speckled-centers"],
                    &[],
                ),
                rule(
                    "septoria-leaf-spot",
                    Strength::Weak,
                    &["small-gray-tan-spots"],
                    &[],
                ),
                rule(
                    "fusarium-wilt",
                    Strength::Weak,
                    &["lower-leaf-yellowing", "plant-wilting", "bottom-up-collapse"],
                    &[],
                ),
                rule(
                    "bacterial-spot",
                    Strength::Strong,
                    &["small-dark-spots"],
                    &["leaf-yellowing", "leaf-drop"],
                ),
                rule(
                    "mosaic-virus",
                    Strength::Medium,
                    &[],
                    &["leaf-mottling", "leaf-distortion"],
                ),
            ],
            symptom_relations: vec![
                relation("early-blight", "brown-leaf-spots", Role::Core, 0.85),
                relation("early-blight", "yellow-halos", Role::Core, 0.85),
                relation("early-blight", "bulls-eye-pattern", Role::Support, 0.80),
                relation("septoria-leaf-spot", "small-gray-tan-spots", Role::Core, 0.85),
                relation("septoria-leaf-spot", "dark-speckled-centers", Role::Core, 0.85),
                relation("fusarium-wilt", "lower-leaf-yellowing", Role::Core, 0.70),
                relation("fusarium-wilt", "plant-wilting", Role::Core, 0.70),
                relation("fusarium-wilt", "bottom-up-collapse", Role::Core, 0.70),
                relation("bacterial-spot", "small-dark-spots", Role::Core, 0.65),
                relation("bacterial-spot", "leaf-yellowing", Role::Support, 0.70),
                relation("bacterial-spot", "leaf-drop", Role::Support, 0.70),
                relation("mosaic-virus", "leaf-mottling", Role::Support, 0.70),
                relation("mosaic-virus", "leaf-distortion", Role::Support, 0.70),
            ],
            impacts: vec![
                impact("fusarium-wilt", "nitrogen", 0.7),
                impact("fusarium-wilt", "potassium", 0.8),
                impact("early-blight", "calcium", 1.2),
            ],
            stage_bases: vec![
                base("nitrogen", "vegetative", 0.85),
                base("potassium", "fruiting", 0.90),
                base("calcium", "flowering", 0.80),
                base("phosphorus", "seedling", 0.75),
            ],
            nutrient_relations: vec![
                nutrient_rel("nitrogen", "pale-green-leaves", 0.90),
                nutrient_rel("nitrogen", "stunted-growth", 0.80),
                nutrient_rel("nitrogen", "lower-leaf-yellowing", 0.85),
                nutrient_rel("potassium", "leaf-edge-browning", 0.90),
                nutrient_rel("potassium", "interveinal-yellowing", 0.60),
                nutrient_rel("calcium", "blossom-end-rot", 0.95),
                nutrient_rel("magnesium", "interveinal-yellowing", 0.85),
            ],
        }
    }
}
