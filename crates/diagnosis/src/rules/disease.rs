//! Primary-Diagnosis Phase: Disease Rules from the Catalog

use super::slots;
use crate::templates::template;
use crate::{phase, Catalog, DiseaseRuleSpec};
use cf_algebra::{min_agg, prob_or, Strength};
use fact_store::Value;
use rule_engine::{ActionContext, EngineError, Rule};
use rule_matcher::{Condition, FieldTest, PatternSpec};

/// Generate primary-diagnosis rules for every disease rule spec.
///
/// Core specs conjoin all their symptoms: the conclusion CF is the
/// strength-scaled minimum over every matched (symptom CF, relation
/// CF) pair, and an absence guard keeps a later rule from overwriting
/// an existing conclusion. Support-only specs accumulate per-symptom
/// contributions through probabilistic OR in a working fact.
pub fn rules(catalog: &Catalog) -> Vec<Rule> {
    let mut rules = Vec::new();
    for (index, spec) in catalog.disease_rules.iter().enumerate() {
        if spec.core.is_empty() {
            rules.extend(support_only_rules(spec, index));
        } else {
            rules.extend(core_rules(spec, index));
        }
    }
    rules
}

/// Conditions matching one symptom and its relation row, binding
/// both CFs
fn evidence_pair(disease: &str, symptom: &str, slot: usize) -> Vec<Condition> {
    vec![
        Condition::Pattern(
            PatternSpec::new(template::SYMPTOM)
                .field("name", FieldTest::eq_symbol(symptom))
                .field("cf", FieldTest::bind(format!("?scf{slot}"))),
        ),
        Condition::Pattern(
            PatternSpec::new(template::DISEASE_RELATION)
                .field("disease", FieldTest::eq_symbol(disease))
                .field("symptom", FieldTest::eq_symbol(symptom))
                .field("cf", FieldTest::bind(format!("?rcf{slot}"))),
        ),
    ]
}

/// Strength-scaled conjunctive CF over the bound evidence pairs
fn scaled_core_cf(
    ctx: &ActionContext<'_>,
    pairs: usize,
    strength: Strength,
) -> Result<f64, EngineError> {
    let mut cfs = Vec::with_capacity(pairs * 2);
    for slot in 0..pairs {
        cfs.push(ctx.require_number(&format!("?scf{slot}"))?);
        cfs.push(ctx.require_number(&format!("?rcf{slot}"))?);
    }
    Ok(strength.scale(min_agg(cfs)))
}

fn conclusion_slots(name: &str, cf: f64, explanation: String, evidence: &[String]) -> Vec<(String, Value)> {
    vec![
        ("name".to_string(), Value::symbol(name)),
        ("cf".to_string(), Value::Float(cf)),
        ("explanation".to_string(), Value::symbol(explanation)),
        (
            "evidence".to_string(),
            Value::List(evidence.iter().map(Value::symbol).collect()),
        ),
    ]
}

/// Rules for a spec with required core symptoms. One variant per
/// any-of gate symptom; a single rule when the gate list is empty.
/// Specificity orders salience so richer presentations fire first.
fn core_rules(spec: &DiseaseRuleSpec, index: usize) -> Vec<Rule> {
    let salience = (spec.core.len() as i32) * 10;
    let gates: Vec<Option<&String>> = if spec.any_of.is_empty() {
        vec![None]
    } else {
        spec.any_of.iter().map(Some).collect()
    };

    gates
        .into_iter()
        .map(|gate| {
            let mut conditions = Vec::new();
            for (slot, symptom) in spec.core.iter().enumerate() {
                conditions.extend(evidence_pair(&spec.disease, symptom, slot));
            }
            if let Some(gate) = gate {
                conditions.push(Condition::Pattern(
                    PatternSpec::new(template::SYMPTOM)
                        .field("name", FieldTest::eq_symbol(gate.as_str())),
                ));
            }
            conditions.push(Condition::Absent(
                PatternSpec::new(template::DISEASE)
                    .field("name", FieldTest::eq_symbol(spec.disease.as_str())),
            ));

            let name = match gate {
                Some(gate) => format!("diagnose-{}-{index}-via-{gate}", spec.disease),
                None => format!("diagnose-{}-{index}", spec.disease),
            };
            let disease = spec.disease.clone();
            let strength = spec.strength;
            let pairs = spec.core.len();
            let mut evidence = spec.core.clone();
            if let Some(gate) = gate {
                evidence.push(gate.clone());
            }

            Rule::new(name, phase::PRIMARY, salience, conditions, move |ctx| {
                let cf = scaled_core_cf(ctx, pairs, strength)?;
                let explanation = format!(
                    "{} indicated by {} ({} rule strength)",
                    disease,
                    evidence.join(", "),
                    strength.as_str(),
                );
                ctx.assert_fact(
                    template::DISEASE,
                    conclusion_slots(&disease, cf, explanation, &evidence)
                        .into_iter()
                        .collect(),
                )?;
                Ok(())
            })
        })
        .collect()
}

/// Rules for a support-only spec: seed the accumulator on the first
/// observed support symptom, fold the rest in with probabilistic OR,
/// then conclude at lower salience.
fn support_only_rules(spec: &DiseaseRuleSpec, index: usize) -> Vec<Rule> {
    let mut rules = Vec::new();

    for symptom in &spec.any_of {
        let mut seed_conditions = evidence_pair(&spec.disease, symptom, 0);
        seed_conditions.push(Condition::Absent(
            PatternSpec::new(template::SUPPORT_ACCUM)
                .field("disease", FieldTest::eq_symbol(spec.disease.as_str())),
        ));
        seed_conditions.push(Condition::Absent(
            PatternSpec::new(template::DISEASE)
                .field("name", FieldTest::eq_symbol(spec.disease.as_str())),
        ));

        let disease = spec.disease.clone();
        let strength = spec.strength;
        let seed_symptom = symptom.clone();
        rules.push(Rule::new(
            format!("suspect-{}-{index}-from-{symptom}", spec.disease),
            phase::PRIMARY,
            40,
            seed_conditions,
            move |ctx| {
                let contribution = scaled_core_cf(ctx, 1, strength)?;
                ctx.assert_fact(
                    template::SUPPORT_ACCUM,
                    slots([
                        ("disease", Value::symbol(&disease)),
                        ("cf", Value::Float(contribution)),
                    ]),
                )?;
                ctx.assert_fact(
                    template::SUPPORT_APPLIED,
                    slots([
                        ("disease", Value::symbol(&disease)),
                        ("symptom", Value::symbol(&seed_symptom)),
                    ]),
                )?;
                Ok(())
            },
        ));

        let mut fold_conditions = evidence_pair(&spec.disease, symptom, 0);
        fold_conditions.push(Condition::Pattern(
            PatternSpec::new(template::SUPPORT_ACCUM)
                .capture("?accum")
                .field("disease", FieldTest::eq_symbol(spec.disease.as_str()))
                .field("cf", FieldTest::bind("?acf")),
        ));
        fold_conditions.push(Condition::Absent(
            PatternSpec::new(template::SUPPORT_APPLIED)
                .field("disease", FieldTest::eq_symbol(spec.disease.as_str()))
                .field("symptom", FieldTest::eq_symbol(symptom.as_str())),
        ));

        let disease = spec.disease.clone();
        let fold_symptom = symptom.clone();
        rules.push(Rule::new(
            format!("corroborate-{}-{index}-with-{symptom}", spec.disease),
            phase::PRIMARY,
            30,
            fold_conditions,
            move |ctx| {
                let contribution = scaled_core_cf(ctx, 1, strength)?;
                let accumulated = prob_or(ctx.require_number("?acf")?, contribution);
                let accum = ctx.require_fact("?accum")?;
                ctx.update(accum, slots([("cf", Value::Float(accumulated))]))?;
                ctx.assert_fact(
                    template::SUPPORT_APPLIED,
                    slots([
                        ("disease", Value::symbol(&disease)),
                        ("symptom", Value::symbol(&fold_symptom)),
                    ]),
                )?;
                Ok(())
            },
        ));
    }

    let disease = spec.disease.clone();
    let strength = spec.strength;
    rules.push(Rule::new(
        format!("conclude-{}-{index}", spec.disease),
        phase::PRIMARY,
        20,
        vec![
            Condition::Pattern(
                PatternSpec::new(template::SUPPORT_ACCUM)
                    .field("disease", FieldTest::eq_symbol(spec.disease.as_str()))
                    .field("cf", FieldTest::bind("?acf")),
            ),
            Condition::Absent(
                PatternSpec::new(template::DISEASE)
                    .field("name", FieldTest::eq_symbol(spec.disease.as_str())),
            ),
        ],
        move |ctx| {
            let cf = ctx.require_number("?acf")?;
            // Evidence list: the support symptoms folded in so far
            let evidence: Vec<String> = ctx
                .store()
                .query(
                    template::SUPPORT_APPLIED,
                    &[("disease".to_string(), Value::symbol(&disease))],
                )
                .filter_map(|f| f.get("symptom").and_then(|v| v.as_symbol()).map(String::from))
                .collect();
            let explanation = format!(
                "{} suggested by corroborating symptoms {} ({} rule strength)",
                disease,
                evidence.join(", "),
                strength.as_str(),
            );
            ctx.assert_fact(
                template::DISEASE,
                conclusion_slots(&disease, cf, explanation, &evidence)
                    .into_iter()
                    .collect(),
            )?;
            Ok(())
        },
    ));

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_generation_counts() {
        let catalog = Catalog::tomato();
        let rules = rules(&catalog);
        // early-blight 1, septoria strong 1 + weak 1, fusarium 1,
        // bacterial-spot 2 gate variants, mosaic 2*(seed+fold)+1
        assert_eq!(rules.len(), 1 + 2 + 1 + 2 + 5);
    }

    #[test]
    fn test_specificity_orders_salience() {
        let catalog = Catalog::tomato();
        let rules = rules(&catalog);
        let strong = rules
            .iter()
            .find(|r| r.name.starts_with("diagnose-septoria-leaf-spot-1"))
            .unwrap();
        let weak = rules
            .iter()
            .find(|r| r.name.starts_with("diagnose-septoria-leaf-spot-2"))
            .unwrap();
        assert!(strong.salience > weak.salience);
    }
}
