//! Rule registry
//!
//! Total mapping from rule identity to definition. Adding a rule means one
//! enum variant, one predicate and one arm here; the match is exhaustive so
//! a forgotten arm is a compile error.

use crate::block;
use crate::rulebook::{RuleDef, RuleId};
use crate::transaction;

pub(crate) fn rule_def(id: RuleId) -> RuleDef {
    match id {
        RuleId::TxSizeWithinBound => RuleDef::Atomic(transaction::tx_size_within_bound),
        RuleId::TxInputsStructural => RuleDef::Atomic(transaction::tx_inputs_structural),
        RuleId::TxInputsResolve => {
            RuleDef::Composite(&[RuleId::TxInputsKnown, RuleId::TxInputsUnspent])
        }
        RuleId::TxInputsKnown => RuleDef::Atomic(transaction::tx_inputs_known),
        RuleId::TxInputsUnspent => RuleDef::Atomic(transaction::tx_inputs_unspent),
        RuleId::TxNoDuplicateInputs => RuleDef::Atomic(transaction::tx_no_duplicate_inputs),
        RuleId::TxCoinbaseMature => RuleDef::Atomic(transaction::tx_coinbase_mature),
        RuleId::TxSignaturesValid => RuleDef::Atomic(transaction::tx_signatures_valid),
        RuleId::TxFeeSufficient => RuleDef::Atomic(transaction::tx_fee_sufficient),
        RuleId::NonceWithinBound => RuleDef::Atomic(block::nonce_within_bound),
        RuleId::BlockSizeWithinBound => RuleDef::Atomic(block::block_size_within_bound),
        RuleId::BlockNotAlreadyKnown => RuleDef::Atomic(block::block_not_already_known),
        RuleId::ProofOfWorkValid => RuleDef::Atomic(block::proof_of_work_valid),
        RuleId::TargetCorrect => RuleDef::Atomic(block::target_correct),
        RuleId::HasTransactions => RuleDef::Atomic(block::has_transactions),
        RuleId::CoinbaseFirst => RuleDef::Atomic(block::coinbase_first),
        RuleId::MerkleRootValid => RuleDef::Atomic(block::merkle_root_valid),
        RuleId::TransactionsWellFormed => RuleDef::Atomic(block::transactions_well_formed),
        RuleId::ParentKnown => RuleDef::Atomic(block::parent_known),
        RuleId::ParentValid => RuleDef::Atomic(block::parent_valid),
        RuleId::HeightConsecutive => RuleDef::Atomic(block::height_consecutive),
        RuleId::NoCoinbaseHashReuse => RuleDef::Atomic(block::no_coinbase_hash_reuse),
        RuleId::TransactionsSpendable => RuleDef::Atomic(block::transactions_spendable),
        RuleId::CoinbaseRewardWithinBound => {
            RuleDef::Atomic(block::coinbase_reward_within_bound)
        }
    }
}
