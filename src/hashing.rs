//! Canonical encoding and hashing
//!
//! Identifiers, the Merkle root and the signing payload are all computed
//! over the same canonical byte encoding, so the size rules and the hashes
//! agree on what a transaction or block "is". The encoding is length-prefixed
//! and little-endian throughout; it is not a wire format.

use sha2::{Digest, Sha256};

use crate::types::{Block, BlockHeader, Hash, OutPoint, Transaction, ZERO_HASH};

/// Double SHA-256
pub fn sha256d(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; 32];
    out.copy_from_slice(&second);
    out
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn put_outpoint(buf: &mut Vec<u8>, outpoint: &OutPoint) {
    buf.extend_from_slice(&outpoint.hash);
    buf.extend_from_slice(&outpoint.index.to_le_bytes());
}

fn encode_transaction_into(buf: &mut Vec<u8>, tx: &Transaction, with_signatures: bool) {
    buf.extend_from_slice(&(tx.inputs.len() as u64).to_le_bytes());
    for input in &tx.inputs {
        put_outpoint(buf, &input.prevout);
        if with_signatures {
            put_bytes(buf, &input.signature);
        } else {
            put_bytes(buf, &[]);
        }
        put_bytes(buf, &input.public_key);
    }
    buf.extend_from_slice(&(tx.outputs.len() as u64).to_le_bytes());
    for output in &tx.outputs {
        buf.extend_from_slice(&output.amount.to_le_bytes());
        put_bytes(buf, &output.recipient);
    }
}

/// Canonical encoding of a transaction, signatures included.
pub fn encode_transaction(tx: &Transaction) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_transaction_into(&mut buf, tx, true);
    buf
}

/// Encoding signed by every input: the transaction with all signature
/// slots blanked, so a signature never covers itself.
pub fn signing_payload(tx: &Transaction) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_transaction_into(&mut buf, tx, false);
    buf
}

/// Canonical encoding of a block header.
pub fn encode_header(header: &BlockHeader) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&header.prev_hash);
    buf.extend_from_slice(&header.merkle_root);
    buf.extend_from_slice(&header.height.to_le_bytes());
    buf.extend_from_slice(&header.timestamp.to_le_bytes());
    buf.extend_from_slice(&header.target);
    put_bytes(&mut buf, &header.nonce);
    buf
}

pub fn transaction_id(tx: &Transaction) -> Hash {
    sha256d(&encode_transaction(tx))
}

pub fn block_hash(header: &BlockHeader) -> Hash {
    sha256d(&encode_header(header))
}

/// Canonical encoded size of a transaction, in bytes.
pub fn transaction_size(tx: &Transaction) -> usize {
    encode_transaction(tx).len()
}

/// Canonical encoded size of a block, in bytes.
pub fn block_size(block: &Block) -> usize {
    let mut size = encode_header(&block.header).len() + 8;
    for tx in &block.transactions {
        size += transaction_size(tx);
    }
    size
}

/// Merkle root over transaction identifiers.
///
/// Pairwise SHA-256d fold; an odd node at any level is paired with itself.
/// The root of an empty set is the zero hash.
pub fn merkle_root(tx_ids: &[Hash]) -> Hash {
    if tx_ids.is_empty() {
        return ZERO_HASH;
    }
    let mut level = tx_ids.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = if pair.len() == 2 { pair[1] } else { pair[0] };
            let mut concat = Vec::with_capacity(64);
            concat.extend_from_slice(&left);
            concat.extend_from_slice(&right);
            next.push(sha256d(&concat));
        }
        level = next;
    }
    level[0]
}

/// Short hex prefix of a hash, for log lines.
pub fn short_id(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{b:02x}")).collect()
}
