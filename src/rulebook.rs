//! Generic rule-evaluation engine
//!
//! A rule book evaluates an ordered list of named predicates over one fact
//! context. Evaluation is strictly sequential and fail-fast: no rule past
//! the first failure runs, and that is part of the contract callers rely on
//! (cheap structural checks are ordered ahead of storage and cryptographic
//! lookups). A composite rule runs its nested list against the same context
//! and reports the nested failure path under its own identity, down to the
//! failing leaf. Collaborator failures abort the evaluation as an error and
//! are never folded into a verdict.

use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::context::FactContext;
use crate::error::ValidationError;

/// Identity of every rule the kernel knows. Rule lists are plain slices of
/// these, so lifecycle stages recombine rules instead of duplicating them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleId {
    // transaction rules
    TxSizeWithinBound,
    TxInputsStructural,
    TxInputsResolve,
    TxInputsKnown,
    TxInputsUnspent,
    TxNoDuplicateInputs,
    TxCoinbaseMature,
    TxSignaturesValid,
    TxFeeSufficient,
    // block rules, incoming
    NonceWithinBound,
    BlockSizeWithinBound,
    BlockNotAlreadyKnown,
    ProofOfWorkValid,
    TargetCorrect,
    HasTransactions,
    CoinbaseFirst,
    MerkleRootValid,
    TransactionsWellFormed,
    ParentKnown,
    ParentValid,
    HeightConsecutive,
    // block rules, connect
    NoCoinbaseHashReuse,
    TransactionsSpendable,
    CoinbaseRewardWithinBound,
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Verdict of a single atomic rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail,
    /// Failure inside a nested book the rule ran itself (per-transaction
    /// block checks); the path names the inner rules down to the leaf.
    FailWithin(Vec<RuleId>),
}

impl RuleOutcome {
    /// `Pass` when the condition holds.
    pub fn passing(condition: bool) -> Self {
        if condition {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail
        }
    }
}

/// Predicate over the fact context. Pure apart from collaborator lookups;
/// must not mutate anything visible outside the validation call.
pub type RulePredicate = fn(&FactContext<'_>) -> Result<RuleOutcome, ValidationError>;

/// Registry entry for one rule identifier.
pub enum RuleDef {
    Atomic(RulePredicate),
    Composite(&'static [RuleId]),
}

/// Verdict of a rule-list evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleBookResult {
    pub passed: bool,
    /// Path from the top-level failing rule down to the failing leaf.
    pub fail_marker: Option<Vec<RuleId>>,
}

impl RuleBookResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            fail_marker: None,
        }
    }

    pub fn fail(path: Vec<RuleId>) -> Self {
        Self {
            passed: false,
            fail_marker: Some(path),
        }
    }

    /// Top-level failing rule, if any.
    pub fn failing_rule(&self) -> Option<RuleId> {
        self.fail_marker.as_ref().and_then(|path| path.first().copied())
    }

    /// Leaf failing rule, if any.
    pub fn failing_leaf(&self) -> Option<RuleId> {
        self.fail_marker.as_ref().and_then(|path| path.last().copied())
    }
}

/// Evaluator over a statically-typed rule registry.
pub struct RuleBook {
    registry: fn(RuleId) -> RuleDef,
}

impl RuleBook {
    pub const fn new(registry: fn(RuleId) -> RuleDef) -> Self {
        Self { registry }
    }

    /// Evaluate `list` in order against `ctx`, stopping at the first
    /// failure. A fatal collaborator error aborts the run.
    pub fn run(
        &self,
        list: &[RuleId],
        ctx: &FactContext<'_>,
    ) -> Result<RuleBookResult, ValidationError> {
        for &id in list {
            trace!("rulebook: evaluating {id}");
            match (self.registry)(id) {
                RuleDef::Atomic(predicate) => match predicate(ctx)? {
                    RuleOutcome::Pass => {}
                    RuleOutcome::Fail => {
                        debug!("rulebook: {id} failed");
                        return Ok(RuleBookResult::fail(vec![id]));
                    }
                    RuleOutcome::FailWithin(inner) => {
                        debug!("rulebook: {id} failed within nested list");
                        let mut path = vec![id];
                        path.extend(inner);
                        return Ok(RuleBookResult::fail(path));
                    }
                },
                RuleDef::Composite(children) => {
                    let result = self.run(children, ctx)?;
                    if !result.passed {
                        debug!("rulebook: composite {id} failed");
                        let mut path = vec![id];
                        path.extend(result.fail_marker.unwrap_or_default());
                        return Ok(RuleBookResult::fail(path));
                    }
                }
            }
        }
        Ok(RuleBookResult::pass())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::StoreError;
    use crate::params::ConsensusParamsBuilder;

    static EVALUATIONS: AtomicUsize = AtomicUsize::new(0);

    fn passes(_ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
        EVALUATIONS.fetch_add(1, Ordering::SeqCst);
        Ok(RuleOutcome::Pass)
    }

    fn fails(_ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
        EVALUATIONS.fetch_add(1, Ordering::SeqCst);
        Ok(RuleOutcome::Fail)
    }

    fn aborts(_ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
        Err(StoreError::Unavailable("store offline".to_string()).into())
    }

    // Test registry reusing arbitrary identifiers as labels for the stub
    // predicates above.
    fn registry(id: RuleId) -> RuleDef {
        match id {
            RuleId::HasTransactions => RuleDef::Atomic(passes),
            RuleId::CoinbaseFirst => RuleDef::Atomic(fails),
            RuleId::MerkleRootValid => RuleDef::Atomic(aborts),
            RuleId::TxInputsResolve => {
                RuleDef::Composite(&[RuleId::HasTransactions, RuleId::CoinbaseFirst])
            }
            _ => RuleDef::Atomic(passes),
        }
    }

    fn run(list: &[RuleId]) -> Result<RuleBookResult, ValidationError> {
        let params = ConsensusParamsBuilder::default().freeze();
        let ctx = FactContext::new(&params);
        RuleBook::new(registry).run(list, &ctx)
    }

    #[test]
    fn test_all_pass() {
        let result = run(&[RuleId::HasTransactions, RuleId::HasTransactions]).unwrap();
        assert!(result.passed);
        assert_eq!(result.fail_marker, None);
    }

    #[test]
    fn test_first_failure_is_reported() {
        let result = run(&[RuleId::CoinbaseFirst, RuleId::HasTransactions]).unwrap();
        assert!(!result.passed);
        assert_eq!(result.fail_marker, Some(vec![RuleId::CoinbaseFirst]));
    }

    #[test]
    fn test_fail_fast_skips_later_rules() {
        let before = EVALUATIONS.load(Ordering::SeqCst);
        let result = run(&[
            RuleId::HasTransactions,
            RuleId::CoinbaseFirst,
            RuleId::HasTransactions,
            RuleId::HasTransactions,
        ])
        .unwrap();
        assert!(!result.passed);
        // the two rules after the failure were never evaluated
        assert_eq!(EVALUATIONS.load(Ordering::SeqCst) - before, 2);
    }

    #[test]
    fn test_composite_failure_records_path_to_leaf() {
        let result = run(&[RuleId::TxInputsResolve]).unwrap();
        assert!(!result.passed);
        assert_eq!(
            result.fail_marker,
            Some(vec![RuleId::TxInputsResolve, RuleId::CoinbaseFirst])
        );
        assert_eq!(result.failing_rule(), Some(RuleId::TxInputsResolve));
        assert_eq!(result.failing_leaf(), Some(RuleId::CoinbaseFirst));
    }

    #[test]
    fn test_collaborator_failure_aborts_run() {
        let err = run(&[RuleId::HasTransactions, RuleId::MerkleRootValid]).unwrap_err();
        assert!(matches!(err, ValidationError::Store(StoreError::Unavailable(_))));
    }
}
