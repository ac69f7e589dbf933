//! Secondary-Diagnosis Phase: Nutrient Deficiency Rules
//!
//! Hypotheses are seeded from the growth-stage base table, scaled by
//! pending cross-domain adjustments, corroborated by symptom evidence,
//! then finalized with a strict-minimum combination. All seven rules
//! are generic joins over the static tables; no nutrient is named in
//! code.

use super::slots;
use crate::phase;
use crate::templates::template;
use cf_algebra::{adjust, final_value, min_agg, prob_or};
use fact_store::Value;
use rule_engine::Rule;
use rule_matcher::{Condition, FieldTest, PatternSpec};

pub fn rules() -> Vec<Rule> {
    vec![
        seed_from_stage(),
        seed_from_evidence(),
        apply_adjustment(),
        seed_evidence_accum(),
        fold_evidence_accum(),
        finalize_with_evidence(),
        finalize_base_only(),
    ]
}

/// Hypothesis seeded from the nutrient-stage base table for the
/// reported growth stage
fn seed_from_stage() -> Rule {
    Rule::new(
        "seed-nutrient-hypothesis",
        phase::SECONDARY,
        100,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::GROWTH_STAGE).field("name", FieldTest::bind("?stage")),
            ),
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_STAGE_BASE)
                    .field("stage", FieldTest::bind("?stage"))
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("cf", FieldTest::bind("?base")),
            ),
            Condition::Absent(
                PatternSpec::new(template::NUTRIENT_HYPOTHESIS)
                    .field("nutrient", FieldTest::bind("?nutrient")),
            ),
        ],
        |ctx| {
            let nutrient = ctx.require_symbol("?nutrient")?;
            let base = ctx.require_number("?base")?;
            ctx.assert_fact(
                template::NUTRIENT_HYPOTHESIS,
                slots([
                    ("nutrient", Value::symbol(nutrient)),
                    ("base-cf", Value::Float(base)),
                    ("adjusted-cf", Value::Float(base)),
                ]),
            )?;
            Ok(())
        },
    )
}

/// A nutrient with observed symptom evidence but no base row for the
/// current stage still gets a hypothesis; base 1.0 leaves the final
/// CF entirely to the evidence term.
fn seed_from_evidence() -> Rule {
    Rule::new(
        "seed-nutrient-hypothesis-from-evidence",
        phase::SECONDARY,
        95,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::SYMPTOM).field("name", FieldTest::bind("?symptom")),
            ),
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_RELATION)
                    .field("symptom", FieldTest::bind("?symptom"))
                    .field("nutrient", FieldTest::bind("?nutrient")),
            ),
            Condition::Absent(
                PatternSpec::new(template::NUTRIENT_HYPOTHESIS)
                    .field("nutrient", FieldTest::bind("?nutrient")),
            ),
        ],
        |ctx| {
            let nutrient = ctx.require_symbol("?nutrient")?;
            ctx.assert_fact(
                template::NUTRIENT_HYPOTHESIS,
                slots([
                    ("nutrient", Value::symbol(nutrient)),
                    ("base-cf", Value::Float(1.0)),
                    ("adjusted-cf", Value::Float(1.0)),
                ]),
            )?;
            Ok(())
        },
    )
}

/// Each pending cross-domain adjustment is applied exactly once,
/// multiplicatively. Application order does not matter.
fn apply_adjustment() -> Rule {
    Rule::new(
        "apply-nutrient-adjustment",
        phase::SECONDARY,
        90,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_HYPOTHESIS)
                    .capture("?hyp")
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("adjusted-cf", FieldTest::bind("?adjusted")),
            ),
            Condition::Pattern(
                PatternSpec::new(template::CF_ADJUSTMENT)
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("disease", FieldTest::bind("?disease"))
                    .field("factor", FieldTest::bind("?factor")),
            ),
            Condition::Absent(
                PatternSpec::new(template::ADJUSTMENT_APPLIED)
                    .field("disease", FieldTest::bind("?disease"))
                    .field("nutrient", FieldTest::bind("?nutrient")),
            ),
        ],
        |ctx| {
            let adjusted = adjust(
                ctx.require_number("?adjusted")?,
                ctx.require_number("?factor")?,
            );
            let hyp = ctx.require_fact("?hyp")?;
            ctx.update(hyp, slots([("adjusted-cf", Value::Float(adjusted))]))?;
            ctx.assert_fact(
                template::ADJUSTMENT_APPLIED,
                slots([
                    ("disease", Value::symbol(ctx.require_symbol("?disease")?)),
                    ("nutrient", Value::symbol(ctx.require_symbol("?nutrient")?)),
                ]),
            )?;
            Ok(())
        },
    )
}

/// First symptom-evidence pair for a nutrient starts the accumulator
fn seed_evidence_accum() -> Rule {
    Rule::new(
        "seed-nutrient-evidence",
        phase::SECONDARY,
        80,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::SYMPTOM)
                    .field("name", FieldTest::bind("?symptom"))
                    .field("cf", FieldTest::bind("?scf")),
            ),
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_RELATION)
                    .field("symptom", FieldTest::bind("?symptom"))
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("cf", FieldTest::bind("?rcf")),
            ),
            Condition::Absent(
                PatternSpec::new(template::NUTRIENT_EVIDENCE)
                    .field("nutrient", FieldTest::bind("?nutrient")),
            ),
        ],
        |ctx| {
            let contribution = min_agg([
                ctx.require_number("?scf")?,
                ctx.require_number("?rcf")?,
            ]);
            ctx.assert_fact(
                template::NUTRIENT_EVIDENCE,
                slots([
                    ("nutrient", Value::symbol(ctx.require_symbol("?nutrient")?)),
                    ("cf", Value::Float(contribution)),
                ]),
            )?;
            ctx.assert_fact(
                template::EVIDENCE_APPLIED,
                slots([
                    ("nutrient", Value::symbol(ctx.require_symbol("?nutrient")?)),
                    ("symptom", Value::symbol(ctx.require_symbol("?symptom")?)),
                ]),
            )?;
            Ok(())
        },
    )
}

/// Further pairs fold in through probabilistic OR, once per symptom
fn fold_evidence_accum() -> Rule {
    Rule::new(
        "fold-nutrient-evidence",
        phase::SECONDARY,
        75,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::SYMPTOM)
                    .field("name", FieldTest::bind("?symptom"))
                    .field("cf", FieldTest::bind("?scf")),
            ),
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_RELATION)
                    .field("symptom", FieldTest::bind("?symptom"))
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("cf", FieldTest::bind("?rcf")),
            ),
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_EVIDENCE)
                    .capture("?accum")
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("cf", FieldTest::bind("?acc")),
            ),
            Condition::Absent(
                PatternSpec::new(template::EVIDENCE_APPLIED)
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("symptom", FieldTest::bind("?symptom")),
            ),
        ],
        |ctx| {
            let contribution = min_agg([
                ctx.require_number("?scf")?,
                ctx.require_number("?rcf")?,
            ]);
            let accumulated = prob_or(ctx.require_number("?acc")?, contribution);
            let accum = ctx.require_fact("?accum")?;
            ctx.update(accum, slots([("cf", Value::Float(accumulated))]))?;
            ctx.assert_fact(
                template::EVIDENCE_APPLIED,
                slots([
                    ("nutrient", Value::symbol(ctx.require_symbol("?nutrient")?)),
                    ("symptom", Value::symbol(ctx.require_symbol("?symptom")?)),
                ]),
            )?;
            Ok(())
        },
    )
}

fn nutrient_conclusion(
    ctx: &mut rule_engine::ActionContext<'_>,
    evidence: Option<f64>,
) -> Result<(), rule_engine::EngineError> {
    let nutrient = ctx.require_symbol("?nutrient")?;
    let base = ctx.require_number("?base")?;
    let adjusted = ctx.require_number("?adjusted")?;
    let cf = final_value(base, adjusted, evidence);
    let explanation = match evidence {
        Some(e) => format!(
            "{nutrient} deficiency: stage base {base:.2}, adjusted {adjusted:.2}, evidence {e:.2}",
        ),
        None => format!(
            "{nutrient} deficiency: stage base {base:.2}, adjusted {adjusted:.2}, no symptom evidence",
        ),
    };
    ctx.assert_fact(
        template::NUTRIENT,
        slots([
            ("name", Value::symbol(nutrient)),
            ("cf", Value::Float(cf)),
            ("explanation", Value::symbol(explanation)),
        ]),
    )?;
    Ok(())
}

/// Final CF is the strict minimum of base, adjusted, and accumulated
/// evidence. Never an average.
fn finalize_with_evidence() -> Rule {
    Rule::new(
        "finalize-nutrient-with-evidence",
        phase::SECONDARY,
        20,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_HYPOTHESIS)
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("base-cf", FieldTest::bind("?base"))
                    .field("adjusted-cf", FieldTest::bind("?adjusted")),
            ),
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_EVIDENCE)
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("cf", FieldTest::bind("?evidence")),
            ),
            Condition::Absent(
                PatternSpec::new(template::NUTRIENT)
                    .field("name", FieldTest::bind("?nutrient")),
            ),
        ],
        |ctx| {
            let evidence = ctx.require_number("?evidence")?;
            nutrient_conclusion(ctx, Some(evidence))
        },
    )
}

fn finalize_base_only() -> Rule {
    Rule::new(
        "finalize-nutrient-base-only",
        phase::SECONDARY,
        10,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::NUTRIENT_HYPOTHESIS)
                    .field("nutrient", FieldTest::bind("?nutrient"))
                    .field("base-cf", FieldTest::bind("?base"))
                    .field("adjusted-cf", FieldTest::bind("?adjusted")),
            ),
            Condition::Absent(
                PatternSpec::new(template::NUTRIENT_EVIDENCE)
                    .field("nutrient", FieldTest::bind("?nutrient")),
            ),
            Condition::Absent(
                PatternSpec::new(template::NUTRIENT)
                    .field("name", FieldTest::bind("?nutrient")),
            ),
        ],
        |ctx| nutrient_conclusion(ctx, None),
    )
}
