//! Block rule sets and validator
//!
//! Blocks pass through three rule lists over their lifecycle. The incoming
//! list covers everything decidable from the block itself plus the chain
//! index; a failure of its parent-lookup rule classifies the block as an
//! orphan rather than invalid. The post-orphan list re-runs just the
//! contextual parent rules once a missing ancestor arrives. The connect list
//! runs when a block is about to extend the active chain and needs the
//! current unspent-output state: full contextual checking of every
//! transaction, intra-block spend tracking included, and the coinbase value
//! bound.

use log::info;
use serde::{Deserialize, Serialize};

use crate::chain::ChainView;
use crate::context::FactContext;
use crate::error::ValidationError;
use crate::hashing;
use crate::params::ConsensusParams;
use crate::registry;
use crate::rulebook::{RuleBook, RuleBookResult, RuleId, RuleOutcome};
use crate::signature::SignatureVerifier;
use crate::transaction::{self, TX_ADMISSION_RULES, TX_STRUCTURAL_RULES};
use crate::types::{Amount, Block, ZERO_HASH};
use crate::utxo::{BlockOverlayView, UtxoView};

/// Rules applied to every block as it arrives, in order. Contextual parent
/// rules come last so every intrinsic defect is surfaced before a block can
/// be classified as an orphan.
pub const INCOMING_BLOCK_RULES: &[RuleId] = &[
    RuleId::NonceWithinBound,
    RuleId::BlockSizeWithinBound,
    RuleId::BlockNotAlreadyKnown,
    RuleId::ProofOfWorkValid,
    RuleId::TargetCorrect,
    RuleId::HasTransactions,
    RuleId::CoinbaseFirst,
    RuleId::MerkleRootValid,
    RuleId::TransactionsWellFormed,
    RuleId::ParentKnown,
    RuleId::ParentValid,
    RuleId::HeightConsecutive,
];

/// Rules re-run on a stored orphan when a candidate parent arrives.
pub const POST_ORPHAN_RULES: &[RuleId] = &[
    RuleId::ParentKnown,
    RuleId::ParentValid,
    RuleId::HeightConsecutive,
];

/// Rules applied when a block is about to connect to the active chain.
pub const CONNECT_BLOCK_RULES: &[RuleId] = &[
    RuleId::NoCoinbaseHashReuse,
    RuleId::TransactionsSpendable,
    RuleId::CoinbaseRewardWithinBound,
];

pub(crate) fn nonce_within_bound(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    Ok(RuleOutcome::passing(
        block.header.nonce.len() <= ctx.params().max_nonce_size(),
    ))
}

pub(crate) fn block_size_within_bound(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    Ok(RuleOutcome::passing(
        hashing::block_size(block) <= ctx.params().max_block_size(),
    ))
}

pub(crate) fn block_not_already_known(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    let known = ctx.chain()?.block_by_hash(&block.hash())?.is_some();
    Ok(RuleOutcome::passing(!known))
}

/// The block hash, read as a big-endian 256-bit value, must not exceed the
/// claimed target. Byte-wise comparison on `[u8; 32]` is exactly that order.
pub(crate) fn proof_of_work_valid(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    Ok(RuleOutcome::passing(block.hash() <= block.header.target))
}

pub(crate) fn target_correct(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    Ok(RuleOutcome::passing(
        block.header.target == *ctx.params().target_value(),
    ))
}

pub(crate) fn has_transactions(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    Ok(RuleOutcome::passing(!block.transactions.is_empty()))
}

/// Exactly one coinbase, and it is the first transaction.
pub(crate) fn coinbase_first(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    let Some(first) = block.transactions.first() else {
        return Ok(RuleOutcome::Fail);
    };
    if !first.is_coinbase() {
        return Ok(RuleOutcome::Fail);
    }
    Ok(RuleOutcome::passing(
        !block.transactions[1..].iter().any(|tx| tx.is_coinbase()),
    ))
}

pub(crate) fn merkle_root_valid(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    let ids: Vec<_> = block.transactions.iter().map(|tx| tx.id()).collect();
    Ok(RuleOutcome::passing(
        hashing::merkle_root(&ids) == block.header.merkle_root,
    ))
}

/// Every transaction passes the structural rule list in isolation. A failure
/// carries the per-transaction path so the verdict names the failing leaf.
pub(crate) fn transactions_well_formed(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    let book = RuleBook::new(registry::rule_def);
    for tx in &block.transactions {
        let sub = FactContext::new(ctx.params()).with_transaction(tx);
        let result = book.run(TX_STRUCTURAL_RULES, &sub)?;
        if !result.passed {
            return Ok(RuleOutcome::FailWithin(
                result.fail_marker.unwrap_or_default(),
            ));
        }
    }
    Ok(RuleOutcome::Pass)
}

pub(crate) fn parent_known(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    // the genesis block has no parent to look up
    if block.header.prev_hash == ZERO_HASH {
        return Ok(RuleOutcome::Pass);
    }
    let known = ctx.chain()?.block_by_hash(&block.header.prev_hash)?.is_some();
    Ok(RuleOutcome::passing(known))
}

pub(crate) fn parent_valid(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    if block.header.prev_hash == ZERO_HASH {
        return Ok(RuleOutcome::Pass);
    }
    match ctx.chain()?.block_by_hash(&block.header.prev_hash)? {
        Some(parent) => Ok(RuleOutcome::passing(parent.valid)),
        None => Ok(RuleOutcome::Fail),
    }
}

pub(crate) fn height_consecutive(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    if block.header.prev_hash == ZERO_HASH {
        return Ok(RuleOutcome::passing(block.header.height == 0));
    }
    match ctx.chain()?.block_by_hash(&block.header.prev_hash)? {
        Some(parent) => Ok(RuleOutcome::passing(
            parent
                .block
                .header
                .height
                .checked_add(1)
                .map(|next| next == block.header.height)
                .unwrap_or(false),
        )),
        None => Ok(RuleOutcome::Fail),
    }
}

/// A coinbase identifier may appear in the chain at most once; a repeat
/// would make two different unspent entries collide on the same outpoints.
pub(crate) fn no_coinbase_hash_reuse(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    let Some(coinbase) = block.transactions.first() else {
        return Ok(RuleOutcome::Fail);
    };
    let seen = ctx.chain()?.coinbase_seen(&coinbase.id())?;
    Ok(RuleOutcome::passing(!seen))
}

/// Full contextual check of every non-coinbase transaction against the
/// unspent-output state the block would actually see, with earlier
/// transactions of the same block applied. Accumulates the fees the block
/// collects for the reward rule that follows.
pub(crate) fn transactions_spendable(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    let base = ctx.utxo()?;
    let signer = ctx.signer()?;
    let book = RuleBook::new(registry::rule_def);
    let mut overlay = BlockOverlayView::new(base);
    let mut fees: Amount = 0;
    for tx in &block.transactions {
        if !tx.is_coinbase() {
            let result = {
                let sub = FactContext::new(ctx.params())
                    .with_transaction(tx)
                    .with_utxo(&overlay)
                    .with_signer(signer)
                    .with_height(block.header.height)
                    .with_strict(true);
                book.run(TX_ADMISSION_RULES, &sub)?
            };
            if !result.passed {
                return Ok(RuleOutcome::FailWithin(
                    result.fail_marker.unwrap_or_default(),
                ));
            }
            // the admission rules passed, so the fee resolves; overflow of
            // the running total still fails the block
            let Some(fee) = transaction::transaction_fee(tx, &overlay)? else {
                return Ok(RuleOutcome::Fail);
            };
            let Some(total) = fees.checked_add(fee) else {
                return Ok(RuleOutcome::Fail);
            };
            fees = total;
        }
        overlay.add_transaction(tx, block.header.height);
    }
    ctx.memoize_collected_fees(fees);
    Ok(RuleOutcome::Pass)
}

/// The coinbase may claim at most the block reward plus the fees the block's
/// transactions pay.
pub(crate) fn coinbase_reward_within_bound(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let block = ctx.block()?;
    let Some(coinbase) = block.transactions.first() else {
        return Ok(RuleOutcome::Fail);
    };
    let fees = match ctx.collected_fees() {
        Some(fees) => fees,
        None => match collect_fees(block, ctx.utxo()?)? {
            Some(fees) => fees,
            None => return Ok(RuleOutcome::Fail),
        },
    };
    let Some(claimed) = coinbase.output_total() else {
        return Ok(RuleOutcome::Fail);
    };
    let Some(bound) = ctx.params().block_reward().checked_add(fees) else {
        return Ok(RuleOutcome::Fail);
    };
    Ok(RuleOutcome::passing(claimed <= bound))
}

/// Replay the block's transactions over an overlay of `base` and sum the
/// fees they pay. `None` when any fee is unresolvable or a sum overflows.
fn collect_fees(
    block: &Block,
    base: &dyn UtxoView,
) -> Result<Option<Amount>, crate::error::StoreError> {
    let mut overlay = BlockOverlayView::new(base);
    let mut fees: Amount = 0;
    for tx in &block.transactions {
        if !tx.is_coinbase() {
            let Some(fee) = transaction::transaction_fee(tx, &overlay)? else {
                return Ok(None);
            };
            let Some(total) = fees.checked_add(fee) else {
                return Ok(None);
            };
            fees = total;
        }
        overlay.add_transaction(tx, block.header.height);
    }
    Ok(Some(fees))
}

/// Lifecycle classification of a checked block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    Valid,
    Invalid,
    /// Intrinsically well-formed, but its parent is not known yet.
    Orphan,
}

/// Verdict of a block-level rule list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockVerdict {
    pub status: BlockStatus,
    /// Path from the failing rule down to the failing leaf, when not valid.
    pub fail_marker: Option<Vec<RuleId>>,
}

impl BlockVerdict {
    fn from_result(result: RuleBookResult) -> Self {
        if result.passed {
            return Self {
                status: BlockStatus::Valid,
                fail_marker: None,
            };
        }
        // only an unknown parent makes an orphan; any earlier rule failure
        // is a defect of the block itself
        let status = if result.failing_rule() == Some(RuleId::ParentKnown) {
            BlockStatus::Orphan
        } else {
            BlockStatus::Invalid
        };
        Self {
            status,
            fail_marker: result.fail_marker,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == BlockStatus::Valid
    }

    pub fn failing_rule(&self) -> Option<RuleId> {
        self.fail_marker.as_ref().and_then(|path| path.first().copied())
    }

    pub fn failing_leaf(&self) -> Option<RuleId> {
        self.fail_marker.as_ref().and_then(|path| path.last().copied())
    }
}

/// Validator over the three block-lifecycle rule lists.
pub struct BlockValidator<'a> {
    params: &'a ConsensusParams,
    utxo: &'a dyn UtxoView,
    chain: &'a dyn ChainView,
    signer: &'a dyn SignatureVerifier,
    book: RuleBook,
}

impl<'a> BlockValidator<'a> {
    pub fn new(
        params: &'a ConsensusParams,
        utxo: &'a dyn UtxoView,
        chain: &'a dyn ChainView,
        signer: &'a dyn SignatureVerifier,
    ) -> Self {
        Self {
            params,
            utxo,
            chain,
            signer,
            book: RuleBook::new(registry::rule_def),
        }
    }

    fn run(&self, block: &Block, list: &[RuleId]) -> Result<BlockVerdict, ValidationError> {
        let ctx = FactContext::new(self.params)
            .with_block(block)
            .with_utxo(self.utxo)
            .with_chain(self.chain)
            .with_signer(self.signer)
            .with_height(block.header.height)
            .with_strict(true);
        let verdict = BlockVerdict::from_result(self.book.run(list, &ctx)?);
        info!(
            "block {} at height {}: {:?}{}",
            hashing::short_id(&block.hash()),
            block.header.height,
            verdict.status,
            match &verdict.fail_marker {
                Some(path) => format!(" ({path:?})"),
                None => String::new(),
            }
        );
        Ok(verdict)
    }

    /// Check an arriving block. `Orphan` means the block should be held and
    /// re-checked with [`check_post_orphan_block_valid`] once its parent
    /// arrives.
    pub fn check_incoming_block_valid(
        &self,
        block: &Block,
    ) -> Result<BlockVerdict, ValidationError> {
        self.run(block, INCOMING_BLOCK_RULES)
    }

    /// Re-check the contextual parent rules of a stored orphan.
    pub fn check_post_orphan_block_valid(
        &self,
        block: &Block,
    ) -> Result<BlockVerdict, ValidationError> {
        self.run(block, POST_ORPHAN_RULES)
    }

    /// Check a block against the unspent-output state just before it would
    /// extend the active chain. Assumes the incoming checks already passed.
    pub fn check_connect_block_valid(
        &self,
        block: &Block,
    ) -> Result<BlockVerdict, ValidationError> {
        self.run(block, CONNECT_BLOCK_RULES)
    }
}
