//! Left-to-Right Condition Evaluation

use crate::{Bindings, Condition, FieldTest, PatternSpec};
use fact_store::{Fact, FactStore};
use tracing::trace;

/// Evaluate an ordered condition list against the store, producing
/// one binding environment per distinct consistent match.
///
/// The result always equals a full from-scratch re-evaluation: the
/// matcher re-scans the store on every call, which is the documented
/// reference strategy for the fact volumes involved (tens per
/// session).
pub fn match_conditions(conditions: &[Condition], store: &FactStore) -> Vec<Bindings> {
    let mut envs = vec![Bindings::new()];
    for condition in conditions {
        if envs.is_empty() {
            break;
        }
        envs = match condition {
            Condition::Pattern(pattern) => envs
                .iter()
                .flat_map(|env| pattern_matches(pattern, store, env))
                .collect(),
            Condition::Absent(pattern) => envs
                .into_iter()
                .filter(|env| pattern_matches(pattern, store, env).is_empty())
                .collect(),
            Condition::Test(test) => envs.into_iter().filter(|env| test(env)).collect(),
        };
    }
    trace!(matches = envs.len(), "conditions evaluated");
    envs
}

/// All extensions of `env` by facts matching `pattern`
fn pattern_matches(pattern: &PatternSpec, store: &FactStore, env: &Bindings) -> Vec<Bindings> {
    store
        .facts_of(&pattern.template)
        .filter_map(|fact| extend(pattern, fact, env))
        .collect()
}

/// Extend the environment with one candidate fact, or reject it
fn extend(pattern: &PatternSpec, fact: &Fact, env: &Bindings) -> Option<Bindings> {
    let mut env = env.clone();
    for (field, test) in &pattern.fields {
        let value = fact.get(field)?;
        match test {
            FieldTest::Equals(expected) => {
                if value != expected {
                    return None;
                }
            }
            FieldTest::Bind(var) => match env.value(var) {
                // Already bound: equality join
                Some(bound) => {
                    if value != bound {
                        return None;
                    }
                }
                None => env.bind_value(var.clone(), value.clone()),
            },
            FieldTest::Satisfies(pred) => {
                if !pred(value, &env) {
                    return None;
                }
            }
        }
    }
    if let Some(var) = &pattern.fact_var {
        env.bind_fact(var.clone(), fact.id());
    }
    Some(env)
}
