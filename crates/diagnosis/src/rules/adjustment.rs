//! Cross-Domain-Adjustment Phase
//!
//! A confirmed disease changes how plausible a nutrient deficiency
//! is. One generic rule joins confident disease conclusions against
//! the impact table and records a pending multiplicative adjustment.

use super::slots;
use crate::templates::template;
use crate::{phase, IMPACT_THRESHOLD};
use fact_store::Value;
use rule_engine::Rule;
use rule_matcher::{Condition, FieldTest, PatternSpec};

pub fn rules() -> Vec<Rule> {
    vec![Rule::new(
        "derive-nutrient-adjustment",
        phase::CROSS_DOMAIN,
        0,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::DISEASE)
                    .field("name", FieldTest::bind("?disease"))
                    .field(
                        "cf",
                        FieldTest::satisfies(|v, _| {
                            v.as_f64().is_some_and(|cf| cf >= IMPACT_THRESHOLD)
                        }),
                    ),
            ),
            Condition::Pattern(
                PatternSpec::new(template::DISEASE_IMPACT)
                    .field("disease", FieldTest::bind("?disease"))
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("factor", FieldTest::bind("?factor")),
            ),
            Condition::Absent(
                PatternSpec::new(template::CF_ADJUSTMENT)
                    .field("disease", FieldTest::bind("?disease"))
                    .field("nutrient", FieldTest::bind("?nutrient")),
            ),
        ],
        |ctx| {
            let disease = ctx.require_symbol("?disease")?;
            let nutrient = ctx.require_symbol("?nutrient")?;
            let factor = ctx.require_number("?factor")?;
            ctx.assert_fact(
                template::CF_ADJUSTMENT,
                slots([
                    ("disease", Value::symbol(disease)),
                    ("nutrient", Value::symbol(nutrient)),
                    ("factor", Value::Float(factor)),
                ]),
            )?;
            Ok(())
        },
    )]
}
