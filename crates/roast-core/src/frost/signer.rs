//! Round one and round two of the FROST signing protocol

use k256::{elliptic_curve::Field, ProjectivePoint, Scalar};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::{
    ciphersuite::Ciphersuite,
    error::{Error, Result},
    frost::participant::{
        compute_binding_factors, compute_challenge, compute_group_commitment,
        derive_interpolating_value, validate_commitments, CommitmentList, NonceCommitment,
    },
    types::{KeyShare, SignerIndex},
};

/// The pair of secret nonces produced in round one.
///
/// A nonce signs at most once: [`Signer::round2`] takes it by value, and the
/// scalars are wiped when the value is dropped.
pub struct Nonce {
    pub(crate) hiding: Scalar,
    pub(crate) binding: Scalar,
}

impl Zeroize for Nonce {
    fn zeroize(&mut self) {
        self.hiding = Scalar::ZERO;
        self.binding = Scalar::ZERO;
    }
}

impl Drop for Nonce {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl zeroize::ZeroizeOnDrop for Nonce {}

/// A single member of the signing group.
pub struct Signer<C: Ciphersuite> {
    suite: C,
    signer_index: SignerIndex,
    secret_share: Scalar,
    public_key: ProjectivePoint,
}

impl<C: Ciphersuite> Signer<C> {
    /// Creates a signer from already-decoded key material.
    pub fn new(
        suite: C,
        signer_index: SignerIndex,
        public_key: ProjectivePoint,
        secret_share: Scalar,
    ) -> Self {
        Self {
            suite,
            signer_index,
            secret_share,
            public_key,
        }
    }

    /// Creates a signer from a stored key share.
    pub fn from_key_share(suite: C, key_share: &KeyShare) -> Result<Self> {
        let public_key = key_share.public_key_point()?;
        Ok(Self::new(
            suite,
            key_share.signer_index,
            public_key,
            key_share.secret_share,
        ))
    }

    pub fn signer_index(&self) -> SignerIndex {
        self.signer_index
    }

    /// Round one: generate a nonce pair and its public commitment, as in
    /// section 5.1 of the FROST draft.
    ///
    /// The nonce must be retained until the coordinator names this signer in
    /// a sign request, then spent on exactly one [`Self::round2`] call.
    pub fn round1(&self) -> Result<(Nonce, NonceCommitment)> {
        let hiding = self.generate_nonce()?;
        let binding = self.generate_nonce()?;

        let commitment = NonceCommitment::new(
            self.signer_index,
            &(ProjectivePoint::GENERATOR * hiding),
            &(ProjectivePoint::GENERATOR * binding),
        );

        Ok((Nonce { hiding, binding }, commitment))
    }

    /// `nonce_generate` from the FROST draft: fresh system randomness salted
    /// with the secret share and run through H3.
    fn generate_nonce(&self) -> Result<Scalar> {
        let mut random = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut random)
            .map_err(|_| Error::Randomness)?;

        let mut secret = [0u8; 32];
        secret.copy_from_slice(&self.secret_share.to_bytes());

        let nonce = self.suite.h3(&random, &[&secret]);
        random.zeroize();
        secret.zeroize();

        Ok(nonce)
    }

    /// Round two: produce this signer's signature share, as in section 5.2
    /// of the FROST draft.
    ///
    /// The commitment list must contain this signer and is fully validated
    /// before any arithmetic; every fault found is reported. The nonce is
    /// consumed and wiped no matter how the call ends.
    pub fn round2(
        &self,
        message: &[u8],
        nonce: Nonce,
        commitments: &CommitmentList,
    ) -> Result<Scalar> {
        let validated = validate_commitments(commitments, Some(self.signer_index))?;

        let binding_factors =
            compute_binding_factors(&self.suite, &self.public_key, &validated, message);
        let binding_factor = *binding_factors
            .get(&self.signer_index)
            .expect("own commitment validated into the list");

        let group_commitment = compute_group_commitment(&validated, &binding_factors);

        let participants = validated.participants();
        let lambda = derive_interpolating_value(self.signer_index, &participants);

        let challenge =
            compute_challenge(&self.suite, message, &group_commitment, &self.public_key);

        // sig_share = hiding_nonce + binding_nonce * rho_i + lambda_i * sk_i * challenge
        let share =
            nonce.hiding + nonce.binding * binding_factor + lambda * self.secret_share * challenge;

        drop(nonce);

        Ok(share)
    }
}

impl<C: Ciphersuite> Drop for Signer<C> {
    fn drop(&mut self) {
        self.secret_share = Scalar::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ciphersuite::Bip340Ciphersuite,
        curve::deserialize_point,
        error::{CommitmentError, CommitmentListError},
    };

    use super::*;

    fn test_signer(signer_index: SignerIndex) -> Signer<Bip340Ciphersuite> {
        Signer::new(
            Bip340Ciphersuite,
            signer_index,
            ProjectivePoint::GENERATOR * Scalar::from(99u64),
            Scalar::from(42u64),
        )
    }

    #[test]
    fn round1_commits_to_fresh_nonces() {
        let signer = test_signer(3);

        let (first_nonce, first_commitment) = signer.round1().expect("round 1");
        let (second_nonce, second_commitment) = signer.round1().expect("round 1");

        assert_eq!(first_commitment.signer_index, 3);
        assert_ne!(first_nonce.hiding, first_nonce.binding);
        assert_ne!(first_nonce.hiding, second_nonce.hiding);
        assert_ne!(first_commitment, second_commitment);

        let hiding = deserialize_point(&first_commitment.hiding).expect("on curve");
        assert_eq!(hiding, ProjectivePoint::GENERATOR * first_nonce.hiding);
        assert!(deserialize_point(&first_commitment.binding).is_some());
    }

    #[test]
    fn round2_rejects_list_without_self() {
        let signer = test_signer(7);
        let (nonce, _) = signer.round1().expect("round 1");

        let other = test_signer(1);
        let (_, commitment) = other.round1().expect("round 1");

        let error = signer
            .round2(b"message", nonce, &vec![commitment].into())
            .expect_err("own commitment missing");

        match error {
            Error::CommitmentList(CommitmentListError(errors)) => {
                assert_eq!(errors, vec![CommitmentError::SelfMissing]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn round2_reports_invalid_commitment_points() {
        let signer = test_signer(2);
        let (nonce, own_commitment) = signer.round1().expect("round 1");

        let mut broken = NonceCommitment::new(
            1,
            &(ProjectivePoint::GENERATOR * Scalar::from(5u64)),
            &(ProjectivePoint::GENERATOR * Scalar::from(6u64)),
        );
        broken.binding = {
            let mut bytes = vec![0u8; 65];
            bytes[0] = 0x04;
            bytes[32] = 0x63;
            bytes[64] = 0x58;
            bytes
        };

        let error = signer
            .round2(b"message", nonce, &vec![broken, own_commitment].into())
            .expect_err("off-curve binding commitment");

        match error {
            Error::CommitmentList(CommitmentListError(errors)) => {
                assert_eq!(
                    errors,
                    vec![CommitmentError::InvalidBindingCommitment { signer_index: 1 }],
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
