//! Two-round FROST threshold Schnorr signing
//!
//! Round one has each participant commit to a pair of secret nonces. Round
//! two binds those commitments to one message and signing set and produces
//! signature shares, which the coordinator aggregates into a plain Schnorr
//! signature. Aggregation alone does not prove honesty: the coordinator must
//! verify the result (and, on failure, individual shares) through the
//! ciphersuite.

mod coordinator;
pub(crate) mod participant;
mod signer;

pub use coordinator::{Coordinator, SessionVerifier};
pub use participant::{
    validate_commitments, CommitmentList, NonceCommitment, ValidatedCommitment,
    ValidatedCommitments,
};
pub use signer::{Nonce, Signer};

#[cfg(test)]
mod tests {
    use k256::{elliptic_curve::Field, Scalar};

    use crate::{
        ciphersuite::{Bip340Ciphersuite, Ciphersuite},
        curve::has_even_y,
        dealer::generate_group,
        error::{Error, VerifyError},
        types::Signature,
    };

    use super::*;

    const MESSAGE: &[u8] = b"For even the very wise cannot see all ends";

    fn signers_for(key_shares: &[crate::types::KeyShare]) -> Vec<Signer<Bip340Ciphersuite>> {
        key_shares
            .iter()
            .map(|share| Signer::from_key_share(Bip340Ciphersuite, share).expect("signer"))
            .collect()
    }

    /// One complete signing attempt over the given signers. Returns the
    /// aggregate signature; parity of its R decides whether it verifies.
    fn sign_once(
        signers: &[Signer<Bip340Ciphersuite>],
        coordinator: &Coordinator<Bip340Ciphersuite>,
    ) -> Signature {
        let mut nonces = Vec::new();
        let mut commitments = Vec::new();
        for signer in signers {
            let (nonce, commitment) = signer.round1().expect("round 1");
            nonces.push(nonce);
            commitments.push(commitment);
        }

        let list: CommitmentList = commitments.into();
        let shares: Vec<Scalar> = signers
            .iter()
            .zip(nonces)
            .map(|(signer, nonce)| signer.round2(MESSAGE, nonce, &list).expect("round 2"))
            .collect();

        coordinator.aggregate(MESSAGE, &list, &shares).expect("aggregate")
    }

    /// 51 of 100 members cooperate; the aggregate verifies on the first
    /// attempt whose R has even Y.
    #[test]
    fn threshold_subset_produces_valid_signature() {
        let suite = Bip340Ciphersuite;
        let (group, key_shares) = generate_group(100, 51).expect("dealer");
        let public_key = group.public_key_point().expect("decodes");

        // the exact subset does not matter; take the first T members
        let signers = signers_for(&key_shares[..51]);
        let coordinator = Coordinator::new(suite, public_key, 51, 100);

        let max_attempts = 64;
        let verified = (0..max_attempts).any(|_| {
            let signature = sign_once(&signers, &coordinator);
            suite
                .verify_signature(&signature, &public_key, MESSAGE)
                .is_ok()
        });

        assert!(verified, "no attempt out of {max_attempts} verified");
    }

    /// The aggregate R has even Y only half the time; an odd-Y aggregate must
    /// fail verification with exactly the parity error, which is what drives
    /// the session-retry loop.
    #[test]
    fn odd_y_aggregate_fails_with_parity_error() {
        let suite = Bip340Ciphersuite;
        let (group, key_shares) = generate_group(3, 2).expect("dealer");
        let public_key = group.public_key_point().expect("decodes");

        let signers = signers_for(&key_shares[..2]);
        let coordinator = Coordinator::new(suite, public_key, 2, 3);

        let mut seen_even = false;
        let mut seen_odd = false;

        for _ in 0..256 {
            let signature = sign_once(&signers, &coordinator);
            let result = suite.verify_signature(&signature, &public_key, MESSAGE);

            if has_even_y(&signature.r) {
                seen_even = true;
                result.expect("even-Y aggregate verifies");
            } else {
                seen_odd = true;
                assert_eq!(result, Err(VerifyError::RYNotEven));
            }

            if seen_even && seen_odd {
                return;
            }
        }

        panic!("256 attempts never produced both R parities");
    }

    /// A corrupted share slips through aggregation but the result fails
    /// BIP-340 verification; per-share verification names the culprit.
    #[test]
    fn corrupt_share_invalidates_aggregate_but_is_attributable() {
        let suite = Bip340Ciphersuite;
        let (group, key_shares) = generate_group(5, 3).expect("dealer");
        let public_key = group.public_key_point().expect("decodes");
        let public_shares = group.public_share_points().expect("decode");

        let signers = signers_for(&key_shares[..3]);
        let coordinator = Coordinator::new(suite, public_key, 3, 5);

        let mut nonces = Vec::new();
        let mut commitments = Vec::new();
        for signer in &signers {
            let (nonce, commitment) = signer.round1().expect("round 1");
            nonces.push(nonce);
            commitments.push(commitment);
        }

        let list: CommitmentList = commitments.clone().into();
        let mut shares: Vec<Scalar> = signers
            .iter()
            .zip(nonces)
            .map(|(signer, nonce)| signer.round2(MESSAGE, nonce, &list).expect("round 2"))
            .collect();

        shares[1] += Scalar::ONE;

        let signature = coordinator.aggregate(MESSAGE, &list, &shares).expect("aggregate");
        assert!(suite.verify_signature(&signature, &public_key, MESSAGE).is_err());

        let validated = validate_commitments(&list, None).expect("valid list");
        let verifier = coordinator.session_verifier(MESSAGE, &validated);

        let mut culprits = Vec::new();
        for (commitment, share) in commitments.iter().zip(&shares) {
            let result = verifier.verify_share(
                &validated,
                commitment.signer_index,
                &public_shares[&commitment.signer_index],
                share,
            );
            if let Err(Error::InvalidSignatureShare(index)) = result {
                culprits.push(index);
            }
        }

        assert_eq!(culprits, vec![commitments[1].signer_index]);
    }
}
