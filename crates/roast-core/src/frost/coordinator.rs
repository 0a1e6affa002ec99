//! Signature share aggregation and per-share verification

use std::collections::BTreeMap;

use k256::{elliptic_curve::Field, ProjectivePoint, Scalar};

use crate::{
    ciphersuite::Ciphersuite,
    error::{Error, Result},
    frost::participant::{
        compute_binding_factors, compute_challenge, compute_group_commitment,
        derive_interpolating_value, validate_commitments, CommitmentList, ValidatedCommitments,
    },
    types::{Signature, SignerIndex},
};

/// The untrusted coordinator of the FROST signing protocol.
///
/// Holds only public group information; it can assemble and check signatures
/// but never touches a secret share.
pub struct Coordinator<C: Ciphersuite> {
    suite: C,
    public_key: ProjectivePoint,
    threshold: usize,
    group_size: usize,
}

impl<C: Ciphersuite> Coordinator<C> {
    pub fn new(suite: C, public_key: ProjectivePoint, threshold: usize, group_size: usize) -> Self {
        Self {
            suite,
            public_key,
            threshold,
            group_size,
        }
    }

    pub fn public_key(&self) -> &ProjectivePoint {
        &self.public_key
    }

    /// Implements signature share aggregation from section 5.3 of the FROST
    /// draft.
    ///
    /// The result is NOT guaranteed to be a valid signature when malicious
    /// shares are present; callers must verify it through the ciphersuite
    /// before publishing. ROAST relies on exactly that property.
    pub fn aggregate(
        &self,
        message: &[u8],
        commitments: &CommitmentList,
        shares: &[Scalar],
    ) -> Result<Signature> {
        if shares.len() != commitments.len() {
            return Err(Error::ShareCountMismatch {
                commitments: commitments.len(),
                shares: shares.len(),
            });
        }
        if shares.len() < self.threshold {
            return Err(Error::NotEnoughShares {
                actual: shares.len(),
                threshold: self.threshold,
            });
        }
        if shares.len() > self.group_size {
            return Err(Error::TooManyShares {
                actual: shares.len(),
                group_size: self.group_size,
            });
        }

        let validated = validate_commitments(commitments, None)?;

        let binding_factors =
            compute_binding_factors(&self.suite, &self.public_key, &validated, message);
        let group_commitment = compute_group_commitment(&validated, &binding_factors);

        // z = sum of z_i mod n
        let z = shares.iter().fold(Scalar::ZERO, |acc, share| acc + share);

        Ok(Signature {
            r: group_commitment,
            z,
        })
    }

    /// Precomputes the values every share of one session verifies against:
    /// binding factors, challenge, and the participant set.
    ///
    /// With large groups this is the dominant cost of share verification, so
    /// the coordinator computes it once per session and reuses it.
    pub fn session_verifier(
        &self,
        message: &[u8],
        commitments: &ValidatedCommitments,
    ) -> SessionVerifier {
        let binding_factors =
            compute_binding_factors(&self.suite, &self.public_key, commitments, message);
        let group_commitment = compute_group_commitment(commitments, &binding_factors);
        let challenge =
            compute_challenge(&self.suite, message, &group_commitment, &self.public_key);
        let participants = commitments.participants();

        SessionVerifier {
            binding_factors,
            challenge,
            participants,
        }
    }

    /// Verifies a single signature share, as in `verify_signature_share` of
    /// the FROST draft.
    ///
    /// For repeated checks against one commitment list, build a
    /// [`SessionVerifier`] instead and reuse it.
    pub fn verify_share(
        &self,
        message: &[u8],
        commitments: &ValidatedCommitments,
        signer_index: SignerIndex,
        public_share: &ProjectivePoint,
        share: &Scalar,
    ) -> Result<()> {
        self.session_verifier(message, commitments)
            .verify_share(commitments, signer_index, public_share, share)
    }
}

/// Cached binding factors and challenge for one signing session.
pub struct SessionVerifier {
    binding_factors: BTreeMap<SignerIndex, Scalar>,
    challenge: Scalar,
    participants: Vec<SignerIndex>,
}

impl SessionVerifier {
    /// Accepts the share iff
    /// `share * G == hiding_i + binding_i * rho_i + PK_i * (challenge * lambda_i)`.
    pub fn verify_share(
        &self,
        commitments: &ValidatedCommitments,
        signer_index: SignerIndex,
        public_share: &ProjectivePoint,
        share: &Scalar,
    ) -> Result<()> {
        let (commitment, binding_factor) = match (
            commitments.get(signer_index),
            self.binding_factors.get(&signer_index),
        ) {
            (Some(commitment), Some(binding_factor)) => (commitment, binding_factor),
            _ => return Err(Error::InvalidSignatureShare(signer_index)),
        };

        let commitment_share = commitment.hiding + commitment.binding * binding_factor;

        let lambda = derive_interpolating_value(signer_index, &self.participants);

        let lhs = ProjectivePoint::GENERATOR * share;
        let rhs = commitment_share + *public_share * (self.challenge * lambda);

        if lhs == rhs {
            Ok(())
        } else {
            Err(Error::InvalidSignatureShare(signer_index))
        }
    }
}
