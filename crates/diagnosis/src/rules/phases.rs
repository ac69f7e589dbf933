//! Phase Advancement
//!
//! The six-phase pipeline is driven by ordinary rules: each phase has
//! a deeply negative-salience advance rule that fires only once the
//! phase has otherwise quiesced, retracts the phase marker, asserts
//! the successor's, and pushes the successor onto the focus stack.
//! The last phase retracts without pushing, so the stack drains and
//! the engine halts.

use super::slots;
use crate::phase;
use crate::templates::template;
use fact_store::Value;
use rule_engine::Rule;
use rule_matcher::{Condition, FieldTest, PatternSpec};

pub fn rules() -> Vec<Rule> {
    phase::PIPELINE
        .iter()
        .enumerate()
        .map(|(i, &current)| {
            let next = phase::PIPELINE.get(i + 1).copied();
            Rule::new(
                format!("advance-{current}"),
                current,
                -100,
                vec![Condition::Pattern(
                    PatternSpec::new(template::PHASE_MARKER)
                        .capture("?marker")
                        .field("name", FieldTest::eq_symbol(current)),
                )],
                move |ctx| {
                    let marker = ctx.require_fact("?marker")?;
                    ctx.retract(marker)?;
                    if let Some(next) = next {
                        ctx.assert_fact(
                            template::PHASE_MARKER,
                            slots([("name", Value::symbol(next))]),
                        )?;
                        ctx.push_focus(next);
                    }
                    Ok(())
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_advance_rule_per_phase() {
        let rules = rules();
        assert_eq!(rules.len(), phase::PIPELINE.len());
        for (rule, name) in rules.iter().zip(phase::PIPELINE) {
            assert_eq!(rule.phase, name);
            assert_eq!(rule.salience, -100);
        }
    }
}
