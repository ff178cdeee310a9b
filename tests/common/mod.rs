//! Shared fixtures for the integration tests

#![allow(dead_code)]

use consensus_kernel::{
    hashing, recipient_commitment, Amount, Block, BlockHeader, ConsensusParams,
    ConsensusParamsBuilder, Hash, Natural, OutPoint, Transaction, TransactionInput,
    TransactionOutput, ZERO_HASH,
};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Near-trivial difficulty so fixture blocks solve in a handful of hash
/// attempts.
pub fn test_params() -> ConsensusParams {
    ConsensusParamsBuilder::new()
        .target_compact(0x20ff_ffff)
        .block_reward(5_000)
        .coinbase_maturity_depth(2)
        .minimum_transaction_fee(1)
        .freeze()
}

pub fn keypair(seed: u8) -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[seed; 32]).expect("32 nonzero bytes");
    let public = PublicKey::from_secret_key(&secp, &secret);
    (secret, public)
}

/// Coinbase paying `amount` to the commitment of `public`. The tag byte
/// makes identifiers distinct across blocks.
pub fn coinbase_to(public: &PublicKey, amount: Amount, tag: u8) -> Transaction {
    Transaction {
        inputs: vec![TransactionInput {
            prevout: OutPoint::coinbase(),
            signature: vec![],
            public_key: vec![tag],
        }],
        outputs: vec![TransactionOutput {
            amount,
            recipient: recipient_commitment(&public.serialize()),
        }],
    }
}

/// Transfer spending `prevout` with a real compact ECDSA signature.
pub fn signed_transfer(
    secret: &SecretKey,
    public: &PublicKey,
    prevout: OutPoint,
    amount: Amount,
    recipient: Vec<u8>,
) -> Transaction {
    let mut tx = Transaction {
        inputs: vec![TransactionInput {
            prevout,
            signature: vec![],
            public_key: public.serialize().to_vec(),
        }],
        outputs: vec![TransactionOutput { amount, recipient }],
    };
    let digest = hashing::sha256d(&hashing::signing_payload(&tx));
    let message = Message::from_digest_slice(&digest).expect("32-byte digest");
    let secp = Secp256k1::new();
    tx.inputs[0].signature = secp.sign_ecdsa(&message, secret).serialize_compact().to_vec();
    tx
}

/// Unsigned transfer for fixtures checked with the null verifier.
pub fn transfer(prevout: OutPoint, amount: Amount) -> Transaction {
    Transaction {
        inputs: vec![TransactionInput {
            prevout,
            signature: vec![],
            public_key: vec![],
        }],
        outputs: vec![TransactionOutput {
            amount,
            recipient: vec![0xbb; 20],
        }],
    }
}

/// Increment the nonce until the block satisfies its own target.
pub fn solve(block: &mut Block, params: &ConsensusParams) {
    let mut counter: u64 = 0;
    loop {
        block.header.nonce = counter.to_le_bytes().to_vec();
        if block.hash() <= *params.target_value() {
            return;
        }
        counter += 1;
    }
}

/// Assemble and solve a block over the given transactions.
pub fn build_block(
    params: &ConsensusParams,
    prev_hash: Hash,
    height: Natural,
    transactions: Vec<Transaction>,
) -> Block {
    let ids: Vec<_> = transactions.iter().map(|tx| tx.id()).collect();
    let mut block = Block {
        header: BlockHeader {
            prev_hash,
            merkle_root: hashing::merkle_root(&ids),
            height,
            timestamp: 1_700_000_000 + height,
            target: *params.target_value(),
            nonce: vec![],
        },
        transactions,
    };
    solve(&mut block, params);
    block
}

pub fn genesis_block(params: &ConsensusParams, public: &PublicKey) -> Block {
    build_block(params, ZERO_HASH, 0, vec![coinbase_to(public, 5_000, 0)])
}
