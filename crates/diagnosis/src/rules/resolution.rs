//! Conflict-Resolution Phase
//!
//! Exactly one final conclusion per category. The winner rule's
//! absence guard requires no sibling with a strictly greater CF;
//! equal maxima fall back to the agenda's creation-order tie-break,
//! and the final-fact guard blocks the runner-up. A sentinel rule at
//! lower salience covers the empty category.

use super::slots;
use crate::templates::template;
use crate::{phase, NONE_CONCLUSION};
use cf_algebra::{meets_threshold, MIN_CONFIDENCE};
use fact_store::Value;
use rule_engine::Rule;
use rule_matcher::{Condition, FieldTest, PatternSpec};

pub fn rules() -> Vec<Rule> {
    vec![
        winner(template::DISEASE, template::FINAL_DISEASE, "select-final-disease"),
        winner(template::NUTRIENT, template::FINAL_NUTRIENT, "select-final-nutrient"),
        sentinel(template::DISEASE, template::FINAL_DISEASE, "no-disease-identified"),
        sentinel(template::NUTRIENT, template::FINAL_NUTRIENT, "no-nutrient-identified"),
    ]
}

fn winner(conclusion: &'static str, final_template: &'static str, name: &str) -> Rule {
    Rule::new(
        name,
        phase::RESOLUTION,
        100,
        vec![
            Condition::Pattern(
                PatternSpec::new(conclusion)
                    .field("name", FieldTest::bind("?name"))
                    .field("cf", FieldTest::bind("?cf"))
                    .field("explanation", FieldTest::bind("?why")),
            ),
            // No sibling beats this candidate
            Condition::Absent(PatternSpec::new(conclusion).field(
                "cf",
                FieldTest::satisfies(|v, env| {
                    match (v.as_f64(), env.number("?cf")) {
                        (Some(other), Some(cf)) => other > cf,
                        _ => false,
                    }
                }),
            )),
            Condition::test(|env| {
                env.number("?cf")
                    .is_some_and(|cf| meets_threshold(cf, MIN_CONFIDENCE))
            }),
            Condition::Absent(PatternSpec::new(final_template)),
        ],
        move |ctx| {
            ctx.assert_fact(
                final_template,
                slots([
                    ("name", Value::symbol(ctx.require_symbol("?name")?)),
                    ("cf", Value::Float(ctx.require_number("?cf")?)),
                    ("explanation", Value::symbol(ctx.require_symbol("?why")?)),
                ]),
            )?;
            Ok(())
        },
    )
}

fn sentinel(conclusion: &'static str, final_template: &'static str, name: &str) -> Rule {
    let explanation = match conclusion {
        template::DISEASE => "no disease reached the minimum confidence",
        _ => "no nutrient deficiency reached the minimum confidence",
    };
    Rule::new(
        name,
        phase::RESOLUTION,
        50,
        vec![
            Condition::Absent(PatternSpec::new(conclusion).field(
                "cf",
                FieldTest::satisfies(|v, _| {
                    v.as_f64().is_some_and(|cf| meets_threshold(cf, MIN_CONFIDENCE))
                }),
            )),
            Condition::Absent(PatternSpec::new(final_template)),
        ],
        move |ctx| {
            ctx.assert_fact(
                final_template,
                slots([
                    ("name", Value::symbol(NONE_CONCLUSION)),
                    ("cf", Value::Float(0.0)),
                    ("explanation", Value::symbol(explanation)),
                ]),
            )?;
            Ok(())
        },
    )
}
