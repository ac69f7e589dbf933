//! Intake Phase: Symptom Normalization

use super::slots;
use crate::phase;
use crate::templates::template;
use cf_algebra::prob_or;
use fact_store::Value;
use rule_engine::Rule;
use rule_matcher::{Condition, FieldTest, PatternSpec};

/// Intake rules: duplicate symptom reports for the same name are
/// merged into one fact with their CFs combined by probabilistic OR.
pub fn rules() -> Vec<Rule> {
    vec![Rule::new(
        "merge-duplicate-symptoms",
        phase::INTAKE,
        0,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::SYMPTOM)
                    .capture("?keep")
                    .field("name", FieldTest::bind("?name"))
                    .field("cf", FieldTest::bind("?cf-a")),
            ),
            Condition::Pattern(
                PatternSpec::new(template::SYMPTOM)
                    .capture("?drop")
                    .field("name", FieldTest::bind("?name"))
                    .field("cf", FieldTest::bind("?cf-b")),
            ),
            // Same name, two distinct fact handles
            Condition::test(|env| env.fact("?keep") != env.fact("?drop")),
        ],
        |ctx| {
            let combined = prob_or(
                ctx.require_number("?cf-a")?,
                ctx.require_number("?cf-b")?,
            );
            let drop = ctx.require_fact("?drop")?;
            let keep = ctx.require_fact("?keep")?;
            ctx.retract(drop)?;
            ctx.update(keep, slots([("cf", Value::Float(combined))]))?;
            Ok(())
        },
    )]
}
