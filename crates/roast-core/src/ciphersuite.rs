//! Ciphersuite abstraction and its BIP-340 specialization
//!
//! FROST requires a cryptographically secure hash function H, specialized
//! into the domain-separated functions H1..H5, together with a point encoding
//! and a signature verification routine. Those pieces vary per ciphersuite;
//! the curve itself is fixed to secp256k1 through the [`k256`] types.

use k256::{
    elliptic_curve::{bigint::U256, ops::Reduce, Group, PrimeField},
    ProjectivePoint, Scalar,
};
use sha2::{Digest, Sha256};

use crate::{
    curve::{has_even_y, is_canonical_field_element, lift_x, x_only},
    error::VerifyError,
    types::Signature,
};

/// The hash set, point encoding, and verification routine of one FROST
/// ciphersuite.
///
/// Each hash function takes a primary message plus, for H2 and H3, auxiliary
/// byte blocks that are concatenated in order. H1, H2, and H3 reduce their
/// output to a scalar; H4 and H5 return the raw 32-byte digest.
pub trait Ciphersuite {
    /// H1: binding-factor derivation.
    fn h1(&self, m: &[u8]) -> Scalar;

    /// H2: signature challenge. For BIP-340 compatibility this must use the
    /// verifier's fixed tag, not a context-string tag.
    fn h2(&self, m: &[u8], ms: &[&[u8]]) -> Scalar;

    /// H3: nonce derivation.
    fn h3(&self, m: &[u8], ms: &[&[u8]]) -> Scalar;

    /// H4: message digest.
    fn h4(&self, m: &[u8]) -> [u8; 32];

    /// H5: commitment-list digest.
    fn h5(&self, m: &[u8]) -> [u8; 32];

    /// Encodes a point in the external form fed to H2: for BIP-340, the
    /// 32-byte big-endian X coordinate.
    fn encode_point(&self, point: &ProjectivePoint) -> [u8; 32];

    /// Verifies an aggregated signature against the group public key.
    fn verify_signature(
        &self,
        signature: &Signature,
        public_key: &ProjectivePoint,
        message: &[u8],
    ) -> Result<(), VerifyError>;
}

/// The BIP-340 ciphersuite over secp256k1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bip340Ciphersuite;

/// Domain-separation context, following the FROST(secp256k1, SHA-256)
/// convention with a BIP340 marker.
const CONTEXT_STRING: &[u8] = b"FROST-secp256k1-BIP340-v1";

/// The challenge tag every BIP-340 verifier uses.
const CHALLENGE_TAG: &[u8] = b"BIP0340/challenge";

/// The tagged hash from BIP-340:
/// `SHA256(SHA256(tag) || SHA256(tag) || data)`, with the data blocks
/// absorbed in order.
pub(crate) fn tagged_hash(tag: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let tag_hash = Sha256::digest(tag);
    let mut hasher = Sha256::new();
    hasher.update(&tag_hash);
    hasher.update(&tag_hash);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Computes a tagged hash and reduces it modulo the group order.
///
/// Reducing a 256-bit digest is safe for secp256k1: the order is close enough
/// to 2^256 that the bias is unobservable (about 1.27 * 2^-128).
fn hash_to_scalar(tag: &[u8], parts: &[&[u8]]) -> Scalar {
    let digest = tagged_hash(tag, parts);
    <Scalar as Reduce<U256>>::reduce_bytes(&digest.into())
}

impl Bip340Ciphersuite {
    /// Verifies a 64-byte BIP-340 signature against an x-only public key,
    /// implementing `Verify(pk, m, sig)` from BIP-340.
    ///
    /// Every rejection reports which check failed; the kinds line up with the
    /// failure annotations of the upstream test vectors.
    pub fn verify(
        &self,
        public_key_x: &[u8; 32],
        message: &[u8],
        signature: &[u8; 64],
    ) -> Result<(), VerifyError> {
        // Let P = lift_x(int(pk)); fail if that fails.
        let public_key = lift_x(public_key_x)?;

        // Let r = int(sig[0:32]); fail if r >= p.
        let r: [u8; 32] = signature[..32].try_into().expect("32-byte slice");
        if !is_canonical_field_element(&r) {
            return Err(VerifyError::RExceedsField);
        }

        // Let s = int(sig[32:64]); fail if s >= n.
        let s_bytes: [u8; 32] = signature[32..].try_into().expect("32-byte slice");
        let s = Option::<Scalar>::from(Scalar::from_repr(s_bytes.into()))
            .ok_or(VerifyError::SExceedsOrder)?;

        // Let e = int(hash_BIP0340/challenge(bytes(r) || bytes(P) || m)) mod n.
        let e = self.h2(&r, &[public_key_x, message]);

        // Let R = s*G - e*P.
        let big_r = ProjectivePoint::GENERATOR * s - public_key * e;

        // Fail if is_infinite(R).
        if bool::from(big_r.is_identity()) {
            return Err(VerifyError::RInfinite);
        }

        // Fail if not has_even_y(R).
        if !has_even_y(&big_r) {
            return Err(VerifyError::RYNotEven);
        }

        // Fail if x(R) != r.
        if x_only(&big_r) != r {
            return Err(VerifyError::RXMismatch);
        }

        Ok(())
    }
}

impl Ciphersuite for Bip340Ciphersuite {
    fn h1(&self, m: &[u8]) -> Scalar {
        let tag = [CONTEXT_STRING, b"rho".as_slice()].concat();
        hash_to_scalar(&tag, &[m])
    }

    fn h2(&self, m: &[u8], ms: &[&[u8]]) -> Scalar {
        let mut parts = Vec::with_capacity(ms.len() + 1);
        parts.push(m);
        parts.extend_from_slice(ms);
        hash_to_scalar(CHALLENGE_TAG, &parts)
    }

    fn h3(&self, m: &[u8], ms: &[&[u8]]) -> Scalar {
        let tag = [CONTEXT_STRING, b"nonce".as_slice()].concat();
        let mut parts = Vec::with_capacity(ms.len() + 1);
        parts.push(m);
        parts.extend_from_slice(ms);
        hash_to_scalar(&tag, &parts)
    }

    fn h4(&self, m: &[u8]) -> [u8; 32] {
        let tag = [CONTEXT_STRING, b"msg".as_slice()].concat();
        tagged_hash(&tag, &[m])
    }

    fn h5(&self, m: &[u8]) -> [u8; 32] {
        let tag = [CONTEXT_STRING, b"com".as_slice()].concat();
        tagged_hash(&tag, &[m])
    }

    fn encode_point(&self, point: &ProjectivePoint) -> [u8; 32] {
        x_only(point)
    }

    fn verify_signature(
        &self,
        signature: &Signature,
        public_key: &ProjectivePoint,
        message: &[u8],
    ) -> Result<(), VerifyError> {
        if bool::from(public_key.is_identity()) {
            return Err(VerifyError::PublicKeyNotOnCurve);
        }
        self.verify(&x_only(public_key), message, &signature.to_bytes())
    }
}
