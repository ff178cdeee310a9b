//! Transaction rule set and validator
//!
//! One rule list serves both standalone pool admission and per-transaction
//! contextual checking during block connection; the structural prefix of the
//! list is what the incoming-block rules run per transaction. Order is part
//! of the contract: cheap structural checks always preempt UTXO and
//! cryptographic lookups.

use std::collections::HashSet;

use crate::context::FactContext;
use crate::error::{StoreError, ValidationError};
use crate::hashing;
use crate::params::ConsensusParams;
use crate::registry;
use crate::rulebook::{RuleBook, RuleBookResult, RuleId, RuleOutcome};
use crate::signature::{recipient_commitment, SignatureVerifier};
use crate::types::{Amount, Natural, Transaction, ZERO_HASH};
use crate::utxo::{UtxoView, MEMPOOL_HEIGHT};

/// Non-contextual rules: what can be said about a transaction in isolation.
pub const TX_STRUCTURAL_RULES: &[RuleId] =
    &[RuleId::TxSizeWithinBound, RuleId::TxInputsStructural];

/// Full rule list for pool admission and contextual connect checking.
pub const TX_ADMISSION_RULES: &[RuleId] = &[
    RuleId::TxSizeWithinBound,
    RuleId::TxInputsStructural,
    RuleId::TxInputsResolve,
    RuleId::TxNoDuplicateInputs,
    RuleId::TxCoinbaseMature,
    RuleId::TxSignaturesValid,
    RuleId::TxFeeSufficient,
];

pub(crate) fn tx_size_within_bound(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let tx = ctx.transaction()?;
    Ok(RuleOutcome::passing(
        hashing::transaction_size(tx) <= ctx.params().max_block_size(),
    ))
}

pub(crate) fn tx_inputs_structural(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let tx = ctx.transaction()?;
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Ok(RuleOutcome::Fail);
    }
    if tx.is_coinbase() {
        return Ok(RuleOutcome::Pass);
    }
    Ok(RuleOutcome::passing(
        tx.inputs.iter().all(|input| input.prevout.hash != ZERO_HASH),
    ))
}

pub(crate) fn tx_inputs_known(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let tx = ctx.transaction()?;
    if tx.is_coinbase() {
        return Ok(RuleOutcome::Pass);
    }
    let utxo = ctx.utxo()?;
    for input in &tx.inputs {
        if utxo.unspent_info(&input.prevout)?.is_none() {
            return Ok(RuleOutcome::Fail);
        }
    }
    Ok(RuleOutcome::Pass)
}

pub(crate) fn tx_inputs_unspent(ctx: &FactContext<'_>) -> Result<RuleOutcome, ValidationError> {
    let tx = ctx.transaction()?;
    if tx.is_coinbase() {
        return Ok(RuleOutcome::Pass);
    }
    let utxo = ctx.utxo()?;
    for input in &tx.inputs {
        match utxo.unspent_info(&input.prevout)? {
            Some(info) if !info.spent => {}
            _ => return Ok(RuleOutcome::Fail),
        }
    }
    Ok(RuleOutcome::Pass)
}

pub(crate) fn tx_no_duplicate_inputs(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let tx = ctx.transaction()?;
    let mut seen = HashSet::new();
    Ok(RuleOutcome::passing(
        tx.inputs.iter().all(|input| seen.insert(&input.prevout)),
    ))
}

/// A coinbase-created entry may only be consumed once buried under the
/// maturity depth. Pool-sentinel entries are never coinbase-mature.
pub(crate) fn tx_coinbase_mature(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let tx = ctx.transaction()?;
    if tx.is_coinbase() {
        return Ok(RuleOutcome::Pass);
    }
    let utxo = ctx.utxo()?;
    let spend_height = ctx.height()?;
    for input in &tx.inputs {
        if let Some(info) = utxo.unspent_info(&input.prevout)? {
            if info.coinbase {
                if info.height == MEMPOOL_HEIGHT {
                    return Ok(RuleOutcome::Fail);
                }
                let depth = spend_height.saturating_sub(info.height);
                if depth < ctx.params().coinbase_maturity_depth() {
                    return Ok(RuleOutcome::Fail);
                }
            }
        }
    }
    Ok(RuleOutcome::Pass)
}

pub(crate) fn tx_signatures_valid(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let tx = ctx.transaction()?;
    if tx.is_coinbase() {
        return Ok(RuleOutcome::Pass);
    }
    let utxo = ctx.utxo()?;
    let signer = ctx.signer()?;
    let digest = hashing::sha256d(&hashing::signing_payload(tx));
    for input in &tx.inputs {
        let Some(info) = utxo.unspent_info(&input.prevout)? else {
            return Ok(RuleOutcome::Fail);
        };
        if recipient_commitment(&input.public_key) != info.recipient {
            return Ok(RuleOutcome::Fail);
        }
        if !signer.verify(&digest, &input.signature, &input.public_key) {
            return Ok(RuleOutcome::Fail);
        }
    }
    Ok(RuleOutcome::Pass)
}

/// Overflow-safe balance rule: inputs must cover outputs, and under strict
/// evaluation the difference must meet the minimum fee.
pub(crate) fn tx_fee_sufficient(
    ctx: &FactContext<'_>,
) -> Result<RuleOutcome, ValidationError> {
    let tx = ctx.transaction()?;
    if tx.is_coinbase() {
        return Ok(RuleOutcome::Pass);
    }
    let Some(fee) = transaction_fee(tx, ctx.utxo()?)? else {
        return Ok(RuleOutcome::Fail);
    };
    if ctx.strict() && fee < ctx.params().minimum_transaction_fee() {
        return Ok(RuleOutcome::Fail);
    }
    Ok(RuleOutcome::Pass)
}

/// Fee a transaction pays against the given view: inputs minus outputs.
/// `None` when an input is unresolvable, a sum overflows, or the inputs do
/// not cover the outputs. Coinbase transactions pay no fee.
pub(crate) fn transaction_fee(
    tx: &Transaction,
    utxo: &dyn UtxoView,
) -> Result<Option<Amount>, StoreError> {
    if tx.is_coinbase() {
        return Ok(Some(0));
    }
    let mut input_total: Amount = 0;
    for input in &tx.inputs {
        let Some(info) = utxo.unspent_info(&input.prevout)? else {
            return Ok(None);
        };
        let Some(total) = input_total.checked_add(info.amount) else {
            return Ok(None);
        };
        input_total = total;
    }
    let Some(output_total) = tx.output_total() else {
        return Ok(None);
    };
    Ok(input_total.checked_sub(output_total))
}

/// Validator for standalone and contextual transaction checking.
pub struct TransactionValidator<'a> {
    params: &'a ConsensusParams,
    utxo: &'a dyn UtxoView,
    signer: &'a dyn SignatureVerifier,
    /// Height the transaction would confirm at (current tip + 1).
    height: Natural,
    book: RuleBook,
}

impl<'a> TransactionValidator<'a> {
    pub fn new(
        params: &'a ConsensusParams,
        utxo: &'a dyn UtxoView,
        signer: &'a dyn SignatureVerifier,
        height: Natural,
    ) -> Self {
        Self {
            params,
            utxo,
            signer,
            height,
            book: RuleBook::new(registry::rule_def),
        }
    }

    /// Run `list` against the transaction. The verdict carries the failing
    /// rule identity; fatal collaborator errors abort instead.
    pub fn validate(
        &self,
        tx: &Transaction,
        list: &[RuleId],
        strict: bool,
    ) -> Result<RuleBookResult, ValidationError> {
        let ctx = FactContext::new(self.params)
            .with_transaction(tx)
            .with_utxo(self.utxo)
            .with_signer(self.signer)
            .with_height(self.height)
            .with_strict(strict);
        self.book.run(list, &ctx)
    }
}
