use ark_ec::AffineRepr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Compress, Valid, Validate};
use rayon::prelude::*;
use std::fmt;

/// Size in bytes of a compressed G1 point.
pub const G1_COMPRESSED_SIZE: usize = 48;

/// Size in bytes of a compressed G2 point.
pub const G2_COMPRESSED_SIZE: usize = 96;

/// Determines which checks are applied to a point after it is decoded.
///
/// Decoding itself always requires the bytes to describe a point on the curve
/// (or the point at infinity). The remaining checks are either applied eagerly
/// here or deferred to the verification engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CheckForCorrectness {
    Full,
    OnlyNonZero,
    OnlyInGroup,
    No,
}

impl fmt::Display for CheckForCorrectness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CheckForCorrectness::Full => write!(f, "Full"),
            CheckForCorrectness::OnlyNonZero => write!(f, "OnlyNonZero"),
            CheckForCorrectness::OnlyInGroup => write!(f, "OnlyInGroup"),
            CheckForCorrectness::No => write!(f, "No"),
        }
    }
}

/// The families of points carried by a transcript or contribution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    G1Power,
    G2Power,
    RunningProduct,
    PotPubkey,
    BlsSignature,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ElementType::G1Power => write!(f, "G1Power"),
            ElementType::G2Power => write!(f, "G2Power"),
            ElementType::RunningProduct => write!(f, "RunningProduct"),
            ElementType::PotPubkey => write!(f, "PotPubkey"),
            ElementType::BlsSignature => write!(f, "BlsSignature"),
        }
    }
}

///
/// Encodes a point as a lowercase, `0x`-prefixed hex string of its
/// compressed form.
///
pub fn encode_point<C: AffineRepr>(point: &C) -> Result<String, crate::Error> {
    let mut bytes = Vec::with_capacity(point.compressed_size());
    point.serialize_compressed(&mut bytes)?;
    Ok(format!("0x{}", hex::encode(bytes)))
}

///
/// Decodes a hex string into a point.
///
/// The `0x` prefix is optional and either letter case is accepted. The decoded
/// length must match the compressed size of the group exactly.
///
pub fn decode_point<C: AffineRepr>(encoded: &str, check: CheckForCorrectness) -> Result<C, crate::Error> {
    let stripped = encoded
        .strip_prefix("0x")
        .or_else(|| encoded.strip_prefix("0X"))
        .unwrap_or(encoded);
    let bytes = hex::decode(stripped)?;

    let expected = C::zero().compressed_size();
    if bytes.len() != expected {
        return Err(crate::Error::InvalidLength {
            expected,
            got: bytes.len(),
        });
    }

    let point = C::deserialize_with_mode(&bytes[..], Compress::Yes, Validate::No)
        .map_err(|_| crate::Error::InvalidPoint)?;

    let single = std::slice::from_ref(&point);
    match check {
        CheckForCorrectness::Full => {
            check_non_zero(single)?;
            check_subgroup(single)?;
        }
        CheckForCorrectness::OnlyNonZero => check_non_zero(single)?,
        CheckForCorrectness::OnlyInGroup => check_subgroup(single)?,
        CheckForCorrectness::No => (),
    }

    Ok(point)
}

///
/// Checks that every element lies in the prime order subgroup.
///
/// Returns the index of the first failing element found by the parallel scan.
/// The point at infinity passes this check.
///
pub fn check_subgroup<C: AffineRepr>(elements: &[C]) -> Result<(), crate::Error> {
    match elements.par_iter().position_first(|p| p.check().is_err()) {
        Some(index) => Err(crate::Error::IncorrectSubgroup { index }),
        None => Ok(()),
    }
}

///
/// Checks that no element is the point at infinity.
///
pub fn check_non_zero<C: AffineRepr>(elements: &[C]) -> Result<(), crate::Error> {
    match elements.par_iter().position_first(|p| p.is_zero()) {
        Some(index) => Err(crate::Error::PointAtInfinity { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, G1Affine, G2Affine};

    use ark_bls12_381::Fq;
    use ark_ec::CurveGroup;

    /// Finds a point on the curve outside the prime order subgroup.
    fn point_outside_subgroup() -> G1Affine {
        (1u64..)
            .filter_map(|x| G1Affine::get_point_from_x_unchecked(Fq::from(x), true))
            .find(|p| !p.is_in_correct_subgroup_assuming_on_curve())
            .expect("the cofactor of G1 is not one")
    }

    #[test]
    fn test_encode_generator() {
        let encoded = encode_point(&G1Affine::generator()).unwrap();

        assert_eq!(2 + 2 * G1_COMPRESSED_SIZE, encoded.len());
        assert!(encoded.starts_with("0x97f1d3a7"));
    }

    #[test]
    fn test_decode_prefix_and_case() {
        let encoded = encode_point(&G2Affine::generator()).unwrap();

        let upper = encoded[2..].to_uppercase();
        let point: G2Affine = decode_point(&upper, CheckForCorrectness::Full).unwrap();
        assert_eq!(G2Affine::generator(), point);

        let point: G2Affine = decode_point(&encoded, CheckForCorrectness::Full).unwrap();
        assert_eq!(G2Affine::generator(), point);
    }

    #[test]
    fn test_decode_wrong_length() {
        // A G2 encoding is never a G1 encoding.
        let encoded = encode_point(&G2Affine::generator()).unwrap();
        let result = decode_point::<G1Affine>(&encoded, CheckForCorrectness::No);
        assert!(matches!(result, Err(Error::InvalidLength { expected: 48, got: 96 })));
    }

    #[test]
    fn test_decode_invalid_hex() {
        let result = decode_point::<G1Affine>("0xzz", CheckForCorrectness::No);
        assert!(matches!(result, Err(Error::InvalidHex(_))));
    }

    #[test]
    fn test_decode_not_on_curve() {
        // Find an x coordinate with no matching y on the G1 curve.
        let x = (1u8..)
            .find(|x| G1Affine::get_point_from_x_unchecked(Fq::from(*x as u64), true).is_none())
            .unwrap();

        // Compression flag set, sign and infinity flags clear.
        let mut bytes = vec![0u8; G1_COMPRESSED_SIZE];
        bytes[0] = 0x80;
        bytes[G1_COMPRESSED_SIZE - 1] = x;

        let result = decode_point::<G1Affine>(&hex::encode(&bytes), CheckForCorrectness::No);
        assert!(matches!(result, Err(Error::InvalidPoint)));
    }

    #[test]
    fn test_infinity_roundtrip_and_non_zero_check() {
        let encoded = encode_point(&G1Affine::zero()).unwrap();
        assert!(encoded.starts_with("0xc0"));

        let point: G1Affine = decode_point(&encoded, CheckForCorrectness::OnlyInGroup).unwrap();
        assert!(point.is_zero());

        let result = decode_point::<G1Affine>(&encoded, CheckForCorrectness::Full);
        assert!(matches!(result, Err(Error::PointAtInfinity { index: 0 })));
    }

    #[test]
    fn test_check_subgroup() {
        let generator = G1Affine::generator();
        let doubled = (generator + generator).into_affine();
        assert!(check_subgroup(&[generator, doubled, G1Affine::zero()]).is_ok());

        let outside = point_outside_subgroup();
        let result = check_subgroup(&[generator, outside]);
        assert!(matches!(result, Err(Error::IncorrectSubgroup { index: 1 })));

        // The decoder accepts the point when the check is deferred.
        let encoded = encode_point(&outside).unwrap();
        assert!(decode_point::<G1Affine>(&encoded, CheckForCorrectness::No).is_ok());
        assert!(decode_point::<G1Affine>(&encoded, CheckForCorrectness::OnlyInGroup).is_err());
    }

    #[test]
    fn test_check_non_zero() {
        let generator = G2Affine::generator();
        assert!(check_non_zero(&[generator, generator]).is_ok());

        let result = check_non_zero(&[generator, generator, G2Affine::zero()]);
        assert!(matches!(result, Err(Error::PointAtInfinity { index: 2 })));
    }
}
