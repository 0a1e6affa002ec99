//! secp256k1 point serialization and BIP-340 helpers
//!
//! Group arithmetic itself comes from [`k256`]; this module carries the two
//! encodings the protocol needs on top of it, plus `lift_x` and Y-parity:
//!
//! - the 65-byte uncompressed SEC1 form used for commitment lists, binding
//!   factors, and every protocol-internal hash input;
//! - the 32-byte x-only form required by BIP-340 challenge computation.
//!
//! The group identity is represented on the wire by the conventional `(0,0)`
//! sentinel. No secp256k1 point has a zero X coordinate, so the sentinel can
//! never collide with a real point and always fails deserialization.

use k256::{
    elliptic_curve::{
        bigint::U256,
        point::{AffineCoordinates, DecompressPoint},
        sec1::{FromEncodedPoint, ToEncodedPoint},
        subtle::Choice,
        Group,
    },
    AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint,
};

use crate::error::VerifyError;

/// Byte length of the uncompressed point serialization.
pub const SERIALIZED_POINT_LENGTH: usize = 65;

/// The secp256k1 field prime P.
const FIELD_MODULUS: U256 =
    U256::from_be_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F");

/// Serializes a point into the fixed-length uncompressed SEC1 form.
///
/// The identity serializes as the `(0,0)` sentinel: an `0x04` tag followed by
/// two all-zero coordinates. [`deserialize_point`] rejects that encoding, so
/// the sentinel round-trips to "no point" rather than to a group element.
pub fn serialize_point(point: &ProjectivePoint) -> [u8; SERIALIZED_POINT_LENGTH] {
    let mut bytes = [0u8; SERIALIZED_POINT_LENGTH];
    bytes[0] = 0x04;
    if bool::from(point.is_identity()) {
        return bytes;
    }
    bytes.copy_from_slice(point.to_affine().to_encoded_point(false).as_bytes());
    bytes
}

/// Deserializes an uncompressed SEC1 point.
///
/// Returns `None` when the input has the wrong length, does not name a point
/// on the curve, or encodes the identity sentinel.
pub fn deserialize_point(bytes: &[u8]) -> Option<ProjectivePoint> {
    if bytes.len() != SERIALIZED_POINT_LENGTH {
        return None;
    }
    let encoded = EncodedPoint::from_bytes(bytes).ok()?;
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))?;
    let point = ProjectivePoint::from(affine);
    if bool::from(point.is_identity()) {
        return None;
    }
    Some(point)
}

/// Encodes a point as its 32-byte big-endian X coordinate, the form BIP-340
/// uses for public keys and challenge inputs.
///
/// The identity sentinel encodes as 32 zero bytes; callers validate points
/// before any encoding that leaves the process.
pub fn x_only(point: &ProjectivePoint) -> [u8; 32] {
    if bool::from(point.is_identity()) {
        return [0u8; 32];
    }
    point.to_affine().x().into()
}

/// Whether the point's affine Y coordinate is even. The identity has no
/// affine representation and reports odd.
pub fn has_even_y(point: &ProjectivePoint) -> bool {
    if bool::from(point.is_identity()) {
        return false;
    }
    !bool::from(point.to_affine().y_is_odd())
}

/// Implements `lift_x(x)` from BIP-340: the unique curve point with the given
/// X coordinate and an even Y coordinate.
///
/// Fails with [`VerifyError::PublicKeyExceedsField`] when `x >= P` and with
/// [`VerifyError::PublicKeyNotOnCurve`] when no curve point has that X.
pub fn lift_x(x_bytes: &[u8; 32]) -> Result<ProjectivePoint, VerifyError> {
    if U256::from_be_slice(x_bytes) >= FIELD_MODULUS {
        return Err(VerifyError::PublicKeyExceedsField);
    }
    let even_y = Choice::from(0);
    let affine = Option::<AffinePoint>::from(AffinePoint::decompress(
        FieldBytes::from_slice(x_bytes),
        even_y,
    ))
    .ok_or(VerifyError::PublicKeyNotOnCurve)?;
    Ok(ProjectivePoint::from(affine))
}

/// Whether `value`, read as a big-endian integer, is a canonical field
/// element, i.e. strictly below the field prime.
pub fn is_canonical_field_element(value: &[u8; 32]) -> bool {
    U256::from_be_slice(value) < FIELD_MODULUS
}

#[cfg(test)]
mod tests {
    use k256::Scalar;

    use super::*;

    const GENERATOR_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const GENERATOR_Y: &str = "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    fn base_mul(k: u64) -> ProjectivePoint {
        ProjectivePoint::GENERATOR * Scalar::from(k)
    }

    #[test]
    fn add_identity_is_noop() {
        let point = base_mul(10);

        assert_eq!(point + ProjectivePoint::IDENTITY, point);
        assert_eq!(ProjectivePoint::IDENTITY + point, point);
    }

    #[test]
    fn sub_self_is_identity() {
        let point = base_mul(10);

        assert_eq!(point - point, ProjectivePoint::IDENTITY);
    }

    #[test]
    fn mul_distributes_over_scalar_addition() {
        let point = base_mul(1337);
        let a = Scalar::from(123u64);
        let b = Scalar::from(4567u64);

        assert_eq!(point * (a + b), point * a + point * b);
        assert_eq!(
            ProjectivePoint::GENERATOR * (a + b),
            ProjectivePoint::GENERATOR * a + ProjectivePoint::GENERATOR * b,
        );
    }

    #[test]
    fn serialize_generator() {
        let serialized = serialize_point(&ProjectivePoint::GENERATOR);

        assert_eq!(
            hex::encode(serialized),
            format!("04{GENERATOR_X}{GENERATOR_Y}"),
        );
    }

    #[test]
    fn serialize_deserialize_roundtrip() {
        let point = base_mul(1337);

        let serialized = serialize_point(&point);
        assert_eq!(serialized.len(), SERIALIZED_POINT_LENGTH);

        let deserialized = deserialize_point(&serialized).expect("valid point");
        assert_eq!(deserialized, point);
    }

    #[test]
    fn deserialize_rejects_malformed_input() {
        let serialized = serialize_point(&base_mul(10));

        // not a curve point: (1, 2)
        let mut off_curve = [0u8; SERIALIZED_POINT_LENGTH];
        off_curve[0] = 0x04;
        off_curve[32] = 1;
        off_curve[64] = 2;

        let cases: Vec<Vec<u8>> = vec![
            vec![],
            serialized[..SERIALIZED_POINT_LENGTH - 1].to_vec(),
            [serialized.as_slice(), [0x01].as_slice()].concat(),
            off_curve.to_vec(),
            serialize_point(&ProjectivePoint::IDENTITY).to_vec(),
        ];

        for case in cases {
            assert!(deserialize_point(&case).is_none(), "accepted {}", hex::encode(&case));
        }
    }

    #[test]
    fn x_only_strips_y() {
        assert_eq!(
            hex::encode(x_only(&ProjectivePoint::GENERATOR)),
            GENERATOR_X,
        );
    }

    #[test]
    fn generator_has_even_y() {
        // Gy ends in 0xb8
        assert!(has_even_y(&ProjectivePoint::GENERATOR));
        assert!(!has_even_y(&(-ProjectivePoint::GENERATOR)));
    }

    #[test]
    fn lift_x_recovers_even_y_point() {
        let mut x = [0u8; 32];
        hex::decode_to_slice(GENERATOR_X, &mut x).unwrap();

        let lifted = lift_x(&x).expect("generator X lifts");
        assert_eq!(lifted, ProjectivePoint::GENERATOR);

        let negated = -ProjectivePoint::GENERATOR;
        let lifted = lift_x(&x_only(&negated)).expect("negated generator X lifts");
        assert_eq!(lifted, ProjectivePoint::GENERATOR);
    }

    #[test]
    fn lift_x_rejects_non_canonical_x() {
        let x = [0xffu8; 32];

        assert_eq!(lift_x(&x), Err(VerifyError::PublicKeyExceedsField));
    }

    #[test]
    fn lift_x_rejects_x_without_curve_point() {
        // public key from BIP-340 test vector 5, documented as not on the curve
        let mut x = [0u8; 32];
        hex::decode_to_slice(
            "eefdea4cdb677750a420fee807eacf21eb9898ae79b9768766e4faa04a2d4a34",
            &mut x,
        )
        .unwrap();

        assert_eq!(lift_x(&x), Err(VerifyError::PublicKeyNotOnCurve));
    }
}
