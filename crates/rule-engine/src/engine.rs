//! Focus-Stack Scheduler and Execution Loop

use crate::agenda::{Activation, ActivationKey, AgendaLedger};
use crate::{ActionContext, EngineError, Rule};
use fact_store::FactStore;
use rule_matcher::match_conditions;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Engine execution limits
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ceiling on total rule firings per engine, guarding against
    /// unintended rule cycles
    pub max_firings: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_firings: 10_000 }
    }
}

/// Outcome of one `run` to quiescence
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Rules fired during this run
    pub firings: usize,
    /// Rule names in firing order (stepwise inference trace)
    pub trace: Vec<String>,
}

/// A forward-chaining engine instance. Owns the fact store, the
/// loaded rules, the focus stack, and the agenda bookkeeping for one
/// diagnosis session. Construct a fresh instance per independent run.
pub struct Engine {
    store: FactStore,
    rules: Vec<Rule>,
    focus: Vec<String>,
    ledger: AgendaLedger,
    config: EngineConfig,
    total_fired: usize,
}

impl Engine {
    /// Engine with an empty store and no rules
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: FactStore::new(),
            rules: Vec::new(),
            focus: Vec::new(),
            ledger: AgendaLedger::new(),
            config,
            total_fired: 0,
        }
    }

    /// Load rule definitions. Names must be unique: agenda identity
    /// is keyed on them.
    pub fn load_rules(&mut self, rules: Vec<Rule>) -> Result<(), EngineError> {
        for rule in rules {
            if self.rules.iter().any(|r| r.name == rule.name) {
                return Err(EngineError::DuplicateRule(rule.name));
            }
            self.rules.push(rule);
        }
        info!(rules = self.rules.len(), "rules loaded");
        Ok(())
    }

    /// Working memory, for the caller's initial fact batch and final
    /// conclusion extraction
    pub fn store(&self) -> &FactStore {
        &self.store
    }

    /// Mutable working memory
    pub fn store_mut(&mut self) -> &mut FactStore {
        &mut self.store
    }

    /// Push a phase onto the focus stack
    pub fn push_focus(&mut self, phase: impl Into<String>) {
        let phase = phase.into();
        debug!(%phase, "focus push");
        self.focus.push(phase);
    }

    /// Current focus stack, bottom to top
    pub fn focus(&self) -> &[String] {
        &self.focus
    }

    /// Total firings across all runs of this engine
    pub fn total_fired(&self) -> usize {
        self.total_fired
    }

    /// Run to quiescence: fire one activation per cycle until the
    /// focus stack is empty. Every mutation is observed by a full
    /// re-match before the next selection. Terminal failure on
    /// budget exhaustion leaves the store intact for inspection.
    pub fn run(&mut self) -> Result<RunSummary, EngineError> {
        let mut trace = Vec::new();

        loop {
            let Some(top) = self.focus.last().cloned() else {
                break;
            };

            let activations = self.compute_activations();
            let present: HashSet<ActivationKey> =
                activations.iter().map(|a| a.key.clone()).collect();
            self.ledger.retain_present(&present);

            // Eligible: top-phase activations that have not fired
            let chosen = activations
                .into_iter()
                .filter(|a| self.rules[a.rule_index].phase == top)
                .filter(|a| !self.ledger.has_fired(&a.key))
                .min_by_key(|a| (-(self.rules[a.rule_index].salience as i64), a.seq));

            let Some(activation) = chosen else {
                debug!(phase = %top, "agenda empty, popping focus");
                self.focus.pop();
                continue;
            };

            if self.total_fired >= self.config.max_firings {
                warn!(fired = self.total_fired, "cycle budget exceeded");
                return Err(EngineError::BudgetExceeded {
                    fired: self.total_fired,
                });
            }

            self.fire(&activation, &mut trace)?;
        }

        info!(firings = trace.len(), "quiescent");
        Ok(RunSummary {
            firings: trace.len(),
            trace,
        })
    }

    /// Execute one activation's action and apply its focus pushes
    fn fire(&mut self, activation: &Activation, trace: &mut Vec<String>) -> Result<(), EngineError> {
        let rule = self.rules[activation.rule_index].clone();
        debug!(rule = %rule.name, phase = %rule.phase, salience = rule.salience, "fire");

        self.ledger.mark_fired(&activation.key);
        let mut context = ActionContext::new(&mut self.store, &activation.bindings);
        (rule.action)(&mut context)?;
        for phase in context.into_pushes() {
            self.push_focus(phase);
        }

        self.total_fired += 1;
        trace.push(rule.name);
        Ok(())
    }

    /// Current activation set for every rule, as a full from-scratch
    /// re-evaluation. New activations receive creation-order sequence
    /// numbers; surviving ones keep theirs.
    fn compute_activations(&mut self) -> Vec<Activation> {
        let mut out = Vec::new();
        for (rule_index, rule) in self.rules.iter().enumerate() {
            for bindings in match_conditions(&rule.conditions, &self.store) {
                let key = ActivationKey::new(&rule.name, &bindings, &self.store);
                let seq = self.ledger.sequence(&key);
                out.push(Activation {
                    rule_index,
                    bindings,
                    key,
                    seq,
                });
            }
        }
        out
    }
}
