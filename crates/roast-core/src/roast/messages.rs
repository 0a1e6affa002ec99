//! Wire-level messages between the ROAST coordinator and signers

use k256::Scalar;
use serde::{Deserialize, Serialize};

use crate::{
    frost::NonceCommitment,
    types::{scalar_serde, SessionId, SignerIndex},
};

/// Coordinator asks every live signer for a round-one commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    /// Identifier of the requesting coordinator
    pub coordinator: u64,
    /// The message that will eventually be signed
    pub message: Vec<u8>,
}

/// Coordinator asks the named signers to sign under a fixed commitment set.
///
/// The commitment list is carried in canonical ascending order by signer
/// index; receivers validate that rather than assume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    /// Identifier of the requesting coordinator
    pub coordinator: u64,
    /// The message to sign
    pub message: Vec<u8>,
    /// Commitments of every session participant
    pub commitments: Vec<NonceCommitment>,
}

/// A signer's answer to a sign request: its signature share for the session,
/// plus a fresh commitment for whatever session comes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareResponse {
    /// Index of the responding signer
    pub signer_index: SignerIndex,
    /// The session the share belongs to
    pub session_id: SessionId,
    /// The signature share
    #[serde(with = "scalar_serde")]
    pub share: Scalar,
    /// Round-one commitment for a future session
    pub fresh_commitment: NonceCommitment,
}
