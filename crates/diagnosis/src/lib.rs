//! Plant Disease & Nutrient-Deficiency Diagnosis
//!
//! Domain configuration on top of the generic rule engine: fact
//! templates, the static relation catalog with load-time validation,
//! rule generation for the six-phase reasoning pipeline, and the
//! per-session diagnosis API.
//!
//! Pipeline: intake → primary-diagnosis → cross-domain-adjustment →
//! secondary-diagnosis → conflict-resolution → output, realized
//! purely as ordinary phase-advance rules.

mod catalog;
mod rules;
mod session;
mod templates;

pub use catalog::{
    Catalog, CatalogError, DiseaseImpact, DiseaseRuleSpec, NutrientRelation,
    NutrientStageBase, Role, SymptomRelation,
};
pub use rules::build_rules;
pub use session::{
    Adjustment, Conclusion, DiagnosisError, DiagnosisReport, DiagnosisSession, Severity,
    SymptomReport,
};
pub use templates::register_templates;

/// Reasoning phase names, bottom of the focus stack first
pub mod phase {
    pub const INTAKE: &str = "intake";
    pub const PRIMARY: &str = "primary-diagnosis";
    pub const CROSS_DOMAIN: &str = "cross-domain-adjustment";
    pub const SECONDARY: &str = "secondary-diagnosis";
    pub const RESOLUTION: &str = "conflict-resolution";
    pub const OUTPUT: &str = "output";

    /// The pipeline in execution order
    pub const PIPELINE: [&str; 6] = [
        INTAKE,
        PRIMARY,
        CROSS_DOMAIN,
        SECONDARY,
        RESOLUTION,
        OUTPUT,
    ];
}

/// Name used by sentinel conclusions when a category stays empty
pub const NONE_CONCLUSION: &str = "none";

/// Disease CF a diagnosis must reach before its nutrient impact
/// factors apply
pub const IMPACT_THRESHOLD: f64 = 0.7;
