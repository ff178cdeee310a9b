//! End-to-end validation pipeline
//!
//! Drives blocks through the full lifecycle the way an embedding node
//! would: incoming check, chain and UTXO bookkeeping, connect check,
//! orphan handling and the post-orphan re-check.

mod common;

use anyhow::Result;
use consensus_kernel::{
    BlockStatus, BlockValidator, MemoryChain, MemoryStore, NullVerifier, OutPoint, RuleId,
    Secp256k1Verifier, Transaction, TransactionInput, TransactionOutput, TransactionValidator,
    UtxoSet, UtxoView, TX_ADMISSION_RULES,
};

use common::*;

#[test]
fn test_three_block_lifecycle_with_real_signatures() -> Result<()> {
    let params = test_params();
    let (secret, public) = keypair(0x21);
    let verifier = Secp256k1Verifier::new();
    let mut utxo = UtxoSet::new(MemoryStore::new());
    let mut chain = MemoryChain::new();

    // genesis
    let genesis = genesis_block(&params, &public);
    {
        let validator = BlockValidator::new(&params, &utxo, &chain, &verifier);
        let verdict = validator.check_incoming_block_valid(&genesis)?;
        assert!(verdict.is_valid(), "genesis failed at {:?}", verdict.fail_marker);
        let verdict = validator.check_connect_block_valid(&genesis)?;
        assert!(verdict.is_valid(), "genesis connect failed at {:?}", verdict.fail_marker);
    }
    utxo.process_block_connected(&genesis)?;
    chain.insert(genesis.clone(), true);
    chain.extend_main(&genesis);

    // an empty spacer block so the genesis coinbase matures
    let spacer = build_block(
        &params,
        genesis.hash(),
        1,
        vec![coinbase_to(&public, 5_000, 1)],
    );
    {
        let validator = BlockValidator::new(&params, &utxo, &chain, &verifier);
        assert!(validator.check_incoming_block_valid(&spacer)?.is_valid());
        assert!(validator.check_connect_block_valid(&spacer)?.is_valid());
    }
    utxo.process_block_connected(&spacer)?;
    chain.insert(spacer.clone(), true);
    chain.extend_main(&spacer);

    // spend the matured genesis coinbase with a genuine signature
    let funding_outpoint = OutPoint {
        hash: genesis.transactions[0].id(),
        index: 0,
    };
    let spend = signed_transfer(
        &secret,
        &public,
        funding_outpoint.clone(),
        4_900,
        vec![0xcc; 20],
    );
    // coinbase claims reward plus the 100 fee
    let block = build_block(
        &params,
        spacer.hash(),
        2,
        vec![coinbase_to(&public, 5_100, 2), spend],
    );
    {
        let validator = BlockValidator::new(&params, &utxo, &chain, &verifier);
        let verdict = validator.check_incoming_block_valid(&block)?;
        assert!(verdict.is_valid(), "incoming failed at {:?}", verdict.fail_marker);
        let verdict = validator.check_connect_block_valid(&block)?;
        assert!(verdict.is_valid(), "connect failed at {:?}", verdict.fail_marker);
    }
    let undo = utxo.process_block_connected(&block)?;
    assert_eq!(undo.len(), 1);
    chain.insert(block.clone(), true);
    chain.extend_main(&block);

    // the funding output is now flagged spent
    assert!(utxo.unspent_info(&funding_outpoint)?.unwrap().spent);

    // a second spend of the same output in a later block is rejected
    let double_spend = signed_transfer(&secret, &public, funding_outpoint, 4_000, vec![0xdd; 20]);
    let bad = build_block(
        &params,
        block.hash(),
        3,
        vec![coinbase_to(&public, 5_000, 3), double_spend],
    );
    let validator = BlockValidator::new(&params, &utxo, &chain, &verifier);
    let verdict = validator.check_connect_block_valid(&bad)?;
    assert_eq!(verdict.status, BlockStatus::Invalid);
    assert_eq!(verdict.failing_rule(), Some(RuleId::TransactionsSpendable));
    assert_eq!(verdict.failing_leaf(), Some(RuleId::TxInputsUnspent));
    Ok(())
}

#[test]
fn test_orphan_held_then_accepted() -> Result<()> {
    let params = test_params();
    let (_, public) = keypair(0x22);
    let mut utxo = UtxoSet::new(MemoryStore::new());
    let mut chain = MemoryChain::new();

    let genesis = genesis_block(&params, &public);
    let child = build_block(
        &params,
        genesis.hash(),
        1,
        vec![coinbase_to(&public, 5_000, 1)],
    );

    // the child arrives before its parent
    {
        let validator = BlockValidator::new(&params, &utxo, &chain, &NullVerifier);
        let verdict = validator.check_incoming_block_valid(&child)?;
        assert_eq!(verdict.status, BlockStatus::Orphan);
        assert_eq!(verdict.fail_marker, Some(vec![RuleId::ParentKnown]));
    }

    // parent arrives, connects, and the orphan is re-checked
    {
        let validator = BlockValidator::new(&params, &utxo, &chain, &NullVerifier);
        assert!(validator.check_incoming_block_valid(&genesis)?.is_valid());
    }
    utxo.process_block_connected(&genesis)?;
    chain.insert(genesis.clone(), true);
    chain.extend_main(&genesis);

    let validator = BlockValidator::new(&params, &utxo, &chain, &NullVerifier);
    let verdict = validator.check_post_orphan_block_valid(&child)?;
    assert!(verdict.is_valid(), "failed at {:?}", verdict.fail_marker);
    Ok(())
}

#[test]
fn test_verdicts_are_deterministic() -> Result<()> {
    let params = test_params();
    let (_, public) = keypair(0x23);
    let utxo = UtxoSet::new(MemoryStore::new());
    let chain = MemoryChain::new();
    let validator = BlockValidator::new(&params, &utxo, &chain, &NullVerifier);

    let orphan = build_block(&params, [5; 32], 9, vec![coinbase_to(&public, 5_000, 9)]);
    let first = validator.check_incoming_block_valid(&orphan)?;
    let second = validator.check_incoming_block_valid(&orphan)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_oversized_transaction_fails_before_any_lookup() -> Result<()> {
    let params = test_params();
    let utxo = UtxoSet::new(MemoryStore::new());
    let validator = TransactionValidator::new(&params, &utxo, &NullVerifier, 5);

    // far over the block-size bound, and every input is unknown too; the
    // size rule must win because it runs first
    let inputs: Vec<_> = (0..10_000u64)
        .map(|i| TransactionInput {
            prevout: OutPoint {
                hash: [(i % 251) as u8; 32],
                index: i,
            },
            signature: vec![0x44; 64],
            public_key: vec![0x03; 33],
        })
        .collect();
    let outputs: Vec<_> = (0..10_000u64)
        .map(|i| TransactionOutput {
            amount: i + 1,
            recipient: vec![0xee; 20],
        })
        .collect();
    let huge = Transaction { inputs, outputs };

    let verdict = validator.validate(&huge, TX_ADMISSION_RULES, true)?;
    assert_eq!(verdict.fail_marker, Some(vec![RuleId::TxSizeWithinBound]));
    Ok(())
}

#[test]
fn test_unrepresentable_output_reference_is_unknown() -> Result<()> {
    let params = test_params();
    let (_, public) = keypair(0x24);
    let mut utxo = UtxoSet::new(MemoryStore::new());
    let genesis = genesis_block(&params, &public);
    utxo.process_block_connected(&genesis)?;

    // references output index u64::MAX of a one-output transaction
    let tx = transfer(
        OutPoint {
            hash: genesis.transactions[0].id(),
            index: u64::MAX,
        },
        100,
    );
    let validator = TransactionValidator::new(&params, &utxo, &NullVerifier, 5);
    let verdict = validator.validate(&tx, TX_ADMISSION_RULES, true)?;
    assert_eq!(
        verdict.fail_marker,
        Some(vec![RuleId::TxInputsResolve, RuleId::TxInputsKnown])
    );
    Ok(())
}
