//! Primitives shared by the signer and the coordinator
//!
//! Commitment-list validation and encoding, binding factors, the group
//! commitment, the signature challenge, and Lagrange interpolation. All of
//! them follow sections 4.2-4.6 of the FROST draft.

use std::collections::BTreeMap;

use k256::{elliptic_curve::Field, ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};

use crate::{
    ciphersuite::Ciphersuite,
    curve::{deserialize_point, serialize_point, SERIALIZED_POINT_LENGTH},
    error::{CommitmentError, CommitmentListError},
    types::SignerIndex,
};

/// Public commitment to a signer's round-one nonces.
///
/// Points travel in their uncompressed SEC1 form and stay as bytes until
/// validation decodes them; a commitment received off the wire may carry
/// arbitrary garbage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceCommitment {
    /// Index of the committing signer
    pub signer_index: SignerIndex,
    /// Commitment to the hiding nonce, serialized
    pub hiding: Vec<u8>,
    /// Commitment to the binding nonce, serialized
    pub binding: Vec<u8>,
}

impl NonceCommitment {
    pub(crate) fn new(
        signer_index: SignerIndex,
        hiding: &ProjectivePoint,
        binding: &ProjectivePoint,
    ) -> Self {
        Self {
            signer_index,
            hiding: serialize_point(hiding).to_vec(),
            binding: serialize_point(binding).to_vec(),
        }
    }
}

/// A commitment list as carried by a sign request.
///
/// Entries are nullable: a relay or coordinator may hand a signer a list with
/// holes in it, and validation must report every such hole rather than
/// assume well-formed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitmentList(Vec<Option<NonceCommitment>>);

impl CommitmentList {
    pub fn new(entries: Vec<Option<NonceCommitment>>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Option<NonceCommitment>> {
        self.0.iter()
    }
}

impl From<Vec<NonceCommitment>> for CommitmentList {
    fn from(entries: Vec<NonceCommitment>) -> Self {
        Self(entries.into_iter().map(Some).collect())
    }
}

/// A commitment entry whose points have been decoded and checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCommitment {
    pub signer_index: SignerIndex,
    pub hiding: ProjectivePoint,
    pub binding: ProjectivePoint,
}

/// A commitment list that passed [`validate_commitments`]: entries are
/// strictly ascending by signer index with both points on the curve and
/// non-identity. Every downstream algorithm takes this type, never a raw
/// list.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCommitments {
    entries: Vec<ValidatedCommitment>,
}

impl ValidatedCommitments {
    pub fn entries(&self) -> &[ValidatedCommitment] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ordered participant indices, as extracted by
    /// `participants_from_commitment_list` in the FROST draft.
    pub fn participants(&self) -> Vec<SignerIndex> {
        self.entries.iter().map(|c| c.signer_index).collect()
    }

    pub fn get(&self, signer_index: SignerIndex) -> Option<&ValidatedCommitment> {
        self.entries
            .iter()
            .find(|c| c.signer_index == signer_index)
    }

    pub fn contains(&self, signer_index: SignerIndex) -> bool {
        self.get(signer_index).is_some()
    }

    /// Implements `encode_group_commitment_list` from the FROST draft,
    /// section 4.3: for every entry, the 8-byte big-endian signer index
    /// followed by both serialized commitment points.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity((8 + 2 * SERIALIZED_POINT_LENGTH) * self.entries.len());
        for commitment in &self.entries {
            bytes.extend_from_slice(&commitment.signer_index.to_be_bytes());
            bytes.extend_from_slice(&serialize_point(&commitment.hiding));
            bytes.extend_from_slice(&serialize_point(&commitment.binding));
        }
        bytes
    }
}

/// Validates a commitment list and decodes its points.
///
/// All faults are collected in a single pass, in list order:
/// - no entry may be missing;
/// - signer indices must be strictly ascending, which also rules out
///   duplicates and the reserved index zero;
/// - both commitment points must decode to non-identity curve points;
/// - with `own_index` supplied (signer context), the caller's own commitment
///   must appear in the list; that fault is reported last.
pub fn validate_commitments(
    commitments: &CommitmentList,
    own_index: Option<SignerIndex>,
) -> Result<ValidatedCommitments, CommitmentListError> {
    let mut errors = Vec::new();
    let mut entries = Vec::with_capacity(commitments.len());
    let mut own_found = own_index.is_none();

    // indices are one-based, so every valid first entry is above this
    let mut last_index: SignerIndex = 0;

    for (position, slot) in commitments.iter().enumerate() {
        let Some(commitment) = slot else {
            errors.push(CommitmentError::Missing { position });
            continue;
        };

        if commitment.signer_index <= last_index {
            errors.push(CommitmentError::NotAscending {
                previous_position: position.saturating_sub(1),
                previous: last_index,
                position,
                current: commitment.signer_index,
            });
        }
        last_index = commitment.signer_index;

        if Some(commitment.signer_index) == own_index {
            own_found = true;
        }

        let binding = deserialize_point(&commitment.binding);
        if binding.is_none() {
            errors.push(CommitmentError::InvalidBindingCommitment {
                signer_index: commitment.signer_index,
            });
        }
        let hiding = deserialize_point(&commitment.hiding);
        if hiding.is_none() {
            errors.push(CommitmentError::InvalidHidingCommitment {
                signer_index: commitment.signer_index,
            });
        }

        if let (Some(hiding), Some(binding)) = (hiding, binding) {
            entries.push(ValidatedCommitment {
                signer_index: commitment.signer_index,
                hiding,
                binding,
            });
        }
    }

    if !own_found {
        errors.push(CommitmentError::SelfMissing);
    }

    if errors.is_empty() {
        Ok(ValidatedCommitments { entries })
    } else {
        Err(CommitmentListError(errors))
    }
}

/// Implements `compute_binding_factors` from the FROST draft, section 4.4.
///
/// The binding factor of signer `i` is
/// `H1(enc(PK) || H4(msg) || H5(enc(commitment_list)) || u64be(i))`, a pure
/// function of the group key, the message, and the full commitment list.
pub(crate) fn compute_binding_factors<C: Ciphersuite>(
    suite: &C,
    public_key: &ProjectivePoint,
    commitments: &ValidatedCommitments,
    message: &[u8],
) -> BTreeMap<SignerIndex, Scalar> {
    let public_key_encoded = serialize_point(public_key);
    let message_hash = suite.h4(message);
    let commitment_hash = suite.h5(&commitments.encode());

    let mut prefix =
        Vec::with_capacity(public_key_encoded.len() + message_hash.len() + commitment_hash.len());
    prefix.extend_from_slice(&public_key_encoded);
    prefix.extend_from_slice(&message_hash);
    prefix.extend_from_slice(&commitment_hash);

    let mut binding_factors = BTreeMap::new();
    for commitment in commitments.entries() {
        let rho_input =
            [prefix.as_slice(), commitment.signer_index.to_be_bytes().as_slice()].concat();
        binding_factors.insert(commitment.signer_index, suite.h1(&rho_input));
    }
    binding_factors
}

/// Implements `compute_group_commitment` from the FROST draft, section 4.5:
/// `R = sum(hiding_i + binding_i * rho_i)` over the commitment list.
pub(crate) fn compute_group_commitment(
    commitments: &ValidatedCommitments,
    binding_factors: &BTreeMap<SignerIndex, Scalar>,
) -> ProjectivePoint {
    let mut group_commitment = ProjectivePoint::IDENTITY;
    for commitment in commitments.entries() {
        let binding_factor = binding_factors
            .get(&commitment.signer_index)
            .expect("binding factor derived for every commitment");
        group_commitment += commitment.hiding + commitment.binding * binding_factor;
    }
    group_commitment
}

/// Implements `compute_challenge` from the FROST draft, section 4.6, using
/// the ciphersuite's external point encoding so the resulting challenge is
/// exactly what a BIP-340 verifier recomputes.
pub(crate) fn compute_challenge<C: Ciphersuite>(
    suite: &C,
    message: &[u8],
    group_commitment: &ProjectivePoint,
    public_key: &ProjectivePoint,
) -> Scalar {
    let group_commitment_encoded = suite.encode_point(group_commitment);
    let public_key_encoded = suite.encode_point(public_key);
    suite.h2(&group_commitment_encoded, &[&public_key_encoded, message])
}

/// Implements `derive_interpolating_value` from the FROST draft, section 4.2:
/// the Lagrange basis polynomial for `x_i` over `participants`, evaluated at
/// zero.
///
/// Callers must have validated the list: all indices distinct and nonzero,
/// with `x_i` among them. Under those preconditions the denominator is
/// invertible.
pub(crate) fn derive_interpolating_value(
    x_i: SignerIndex,
    participants: &[SignerIndex],
) -> Scalar {
    let mut numerator = Scalar::ONE;
    let mut denominator = Scalar::ONE;

    for &x_j in participants {
        if x_j == x_i {
            continue;
        }
        numerator *= Scalar::from(x_j);
        denominator *= if x_j > x_i {
            Scalar::from(x_j - x_i)
        } else {
            -Scalar::from(x_i - x_j)
        };
    }

    numerator * Option::<Scalar>::from(denominator.invert()).unwrap_or(Scalar::ONE)
}
