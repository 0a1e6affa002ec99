//! Deterministic ROAST identifiers
//!
//! Sessions, commitments, and retained nonces are all addressed by BIP-340
//! tagged hashes so that every implementation derives byte-identical
//! identifiers from the same wire data.

use crate::{
    ciphersuite::tagged_hash,
    frost::NonceCommitment,
    types::{SessionId, SignerIndex},
};

const COMMIT_HASH_TAG: &[u8] = b"roast/commit_hash";
const COMMIT_LIST_HASH_TAG: &[u8] = b"roast/commit_list_hash";
const RESPONSE_HASH_TAG: &[u8] = b"roast/response_hash";

/// Hash of a single nonce commitment:
/// `H(u64be(signer_index) || enc(hiding) || enc(binding))`.
pub fn commit_hash(commitment: &NonceCommitment) -> [u8; 32] {
    tagged_hash(
        COMMIT_HASH_TAG,
        &[
            &commitment.signer_index.to_be_bytes(),
            &commitment.hiding,
            &commitment.binding,
        ],
    )
}

/// Session identifier: the hash of the concatenated commitment hashes, in
/// list order.
pub fn commit_list_hash(commitments: &[NonceCommitment]) -> SessionId {
    let mut hashes = Vec::with_capacity(32 * commitments.len());
    for commitment in commitments {
        hashes.extend_from_slice(&commit_hash(commitment));
    }
    tagged_hash(COMMIT_LIST_HASH_TAG, &[&hashes])
}

/// Tag under which a signer retains the nonce behind a commitment it sent to
/// a particular coordinator. Distinct coordinators yield distinct tags, so
/// one signer can serve several concurrent signing requests without mixing
/// nonces.
pub fn response_tag(commitment: &NonceCommitment, coordinator: u64) -> [u8; 32] {
    tagged_hash(
        RESPONSE_HASH_TAG,
        &[
            &commitment.signer_index.to_be_bytes(),
            &commitment.hiding,
            &commitment.binding,
            &coordinator.to_be_bytes(),
        ],
    )
}

/// Convenience for logging: the first bytes of an identifier in hex.
pub(crate) fn short_id(id: &[u8; 32]) -> String {
    hex::encode(&id[..8])
}
