//! Per-call fact context
//!
//! A validation call assembles one context: the candidate object, the frozen
//! consensus parameters and references to the collaborators the rules query.
//! Contexts are created fresh per call and discarded afterwards. Rules read
//! the context; the one write channel is the memo, where a rule may park a
//! derived value for rules later in the same list.

use std::cell::RefCell;

use crate::chain::ChainView;
use crate::error::ValidationError;
use crate::params::ConsensusParams;
use crate::signature::SignatureVerifier;
use crate::types::{Amount, Block, Natural, Transaction};
use crate::utxo::UtxoView;

#[derive(Default)]
struct FactMemo {
    collected_fees: Option<Amount>,
}

pub struct FactContext<'a> {
    params: &'a ConsensusParams,
    block: Option<&'a Block>,
    transaction: Option<&'a Transaction>,
    utxo: Option<&'a dyn UtxoView>,
    chain: Option<&'a dyn ChainView>,
    signer: Option<&'a dyn SignatureVerifier>,
    height: Option<Natural>,
    strict: bool,
    memo: RefCell<FactMemo>,
}

impl<'a> FactContext<'a> {
    pub fn new(params: &'a ConsensusParams) -> Self {
        Self {
            params,
            block: None,
            transaction: None,
            utxo: None,
            chain: None,
            signer: None,
            height: None,
            strict: false,
            memo: RefCell::new(FactMemo::default()),
        }
    }

    pub fn with_block(mut self, block: &'a Block) -> Self {
        self.block = Some(block);
        self
    }

    pub fn with_transaction(mut self, transaction: &'a Transaction) -> Self {
        self.transaction = Some(transaction);
        self
    }

    pub fn with_utxo(mut self, utxo: &'a dyn UtxoView) -> Self {
        self.utxo = Some(utxo);
        self
    }

    pub fn with_chain(mut self, chain: &'a dyn ChainView) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_signer(mut self, signer: &'a dyn SignatureVerifier) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Height the candidate would occupy if accepted; consumed by
    /// maturity- and height-sensitive rules.
    pub fn with_height(mut self, height: Natural) -> Self {
        self.height = Some(height);
        self
    }

    /// Strict evaluation additionally enforces the minimum-fee requirement.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn params(&self) -> &'a ConsensusParams {
        self.params
    }

    pub fn block(&self) -> Result<&'a Block, ValidationError> {
        self.block.ok_or(ValidationError::MissingFact("block"))
    }

    pub fn transaction(&self) -> Result<&'a Transaction, ValidationError> {
        self.transaction
            .ok_or(ValidationError::MissingFact("transaction"))
    }

    pub fn utxo(&self) -> Result<&'a dyn UtxoView, ValidationError> {
        self.utxo.ok_or(ValidationError::MissingFact("utxoSet"))
    }

    pub fn chain(&self) -> Result<&'a dyn ChainView, ValidationError> {
        self.chain.ok_or(ValidationError::MissingFact("chain"))
    }

    pub fn signer(&self) -> Result<&'a dyn SignatureVerifier, ValidationError> {
        self.signer.ok_or(ValidationError::MissingFact("signer"))
    }

    pub fn height(&self) -> Result<Natural, ValidationError> {
        self.height.ok_or(ValidationError::MissingFact("height"))
    }

    pub fn strict(&self) -> bool {
        self.strict
    }

    /// Fees accumulated by the contextual per-transaction check, parked for
    /// the reward rule later in the same list.
    pub fn memoize_collected_fees(&self, fees: Amount) {
        self.memo.borrow_mut().collected_fees = Some(fees);
    }

    pub fn collected_fees(&self) -> Option<Amount> {
        self.memo.borrow().collected_fees
    }
}
