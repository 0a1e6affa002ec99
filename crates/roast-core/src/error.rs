//! Error types for the threshold signing protocol

use std::fmt;

use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during protocol execution
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid group configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A commitment list failed validation; every fault found is reported
    #[error("invalid commitment list: {0}")]
    CommitmentList(#[from] CommitmentListError),

    /// A signature share did not verify against the signer's commitment
    #[error("invalid signature share from signer [{0}]")]
    InvalidSignatureShare(u64),

    /// The aggregated signature failed BIP-340 verification
    #[error("aggregate signature failed verification: {0}")]
    AggregateVerifyFailed(#[source] VerifyError),

    /// Too few non-quarantined signers remain to ever reach the threshold
    #[error("not enough live signers; has [{available}] for threshold [{threshold}]")]
    InsufficientSigners { available: usize, threshold: usize },

    /// Commitment and share counts passed to aggregation do not line up
    #[error(
        "the number of commitments and signature shares do not match; \
         has [{commitments}] commitments and [{shares}] signature shares"
    )]
    ShareCountMismatch { commitments: usize, shares: usize },

    /// Fewer shares than the signing threshold
    #[error("not enough shares; has [{actual}] for threshold [{threshold}]")]
    NotEnoughShares { actual: usize, threshold: usize },

    /// More shares than the group has members
    #[error("too many shares; has [{actual}] for group size [{group_size}]")]
    TooManyShares { actual: usize, group_size: usize },

    /// Key material carried a point encoding that does not decode
    #[error("malformed point encoding for {0}")]
    MalformedPoint(&'static str),

    /// The operating system randomness source failed
    #[error("randomness source failure")]
    Randomness,
}

/// A single fault found while validating a commitment list.
///
/// Validation does not stop at the first problem; all faults are collected
/// into a [`CommitmentListError`] so a misbehaving group can be debugged in
/// one pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    /// The list has a hole at this position
    #[error("commitment at position [{position}] is missing")]
    Missing { position: usize },

    /// Neighbouring entries are out of order or duplicated
    #[error(
        "commitments not sorted in ascending order: \
         commitments[{previous_position}].signer_index={previous}, \
         commitments[{position}].signer_index={current}"
    )]
    NotAscending {
        previous_position: usize,
        previous: u64,
        position: usize,
        current: u64,
    },

    /// The hiding nonce commitment is not a non-identity point on the curve
    #[error(
        "hiding nonce commitment from signer [{signer_index}] is not a valid \
         non-identity point on the curve"
    )]
    InvalidHidingCommitment { signer_index: u64 },

    /// The binding nonce commitment is not a non-identity point on the curve
    #[error(
        "binding nonce commitment from signer [{signer_index}] is not a valid \
         non-identity point on the curve"
    )]
    InvalidBindingCommitment { signer_index: u64 },

    /// The validating signer's own commitment is absent from the list
    #[error("current signer's commitment not found on the list")]
    SelfMissing,
}

/// All faults found in one validation pass over a commitment list, in list
/// order, with [`CommitmentError::SelfMissing`] last when it applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentListError(pub Vec<CommitmentError>);

impl fmt::Display for CommitmentListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CommitmentListError {}

/// BIP-340 signature rejection reasons.
///
/// Each check in the verification algorithm reports its own kind, mirroring
/// the failure comments of the upstream test vectors.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// No curve point exists for the public key X coordinate
    #[error("public key is not a point on the curve")]
    PublicKeyNotOnCurve,

    /// The public key X coordinate is not a canonical field element
    #[error("public key X coordinate exceeds the field size")]
    PublicKeyExceedsField,

    /// r >= P
    #[error("signature r exceeds the field size")]
    RExceedsField,

    /// s >= N
    #[error("signature s exceeds the group order")]
    SExceedsOrder,

    /// The recomputed R is the point at infinity
    #[error("point R is infinite")]
    RInfinite,

    /// The recomputed R has an odd Y coordinate
    #[error("coordinate R.y is not even")]
    RYNotEven,

    /// The recomputed R does not match the signature's r
    #[error("coordinate R.x does not match r")]
    RXMismatch,
}
