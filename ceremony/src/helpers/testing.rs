//! Fixtures shared by the unit tests, the integration tests and the benches.

use crate::{Ceremony, Secret};
use setup_utils::{Fq, Fr, G1Affine, G1Projective, G2Affine, G2Projective, SECRET_SIZE};

use ark_ec::{CurveGroup, Group};
use ark_ff::UniformRand;
use rand::Rng;

/// The transcript sizes used throughout the tests.
pub const TEST_SIZES: [(usize, usize); 2] = [(4, 2), (8, 3)];

/// Returns a genesis ceremony with the test sizes.
pub fn test_ceremony() -> Ceremony {
    Ceremony::new(&TEST_SIZES).expect("test sizes are valid")
}

/// Returns the secret encoding the given small scalar.
pub fn secret_from_u64(value: u64) -> Secret {
    let mut bytes = [0u8; SECRET_SIZE];
    bytes[SECRET_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
    Secret::from_bytes(bytes)
}

/// Returns a random G1 point in the prime order subgroup.
pub fn random_g1<R: Rng>(rng: &mut R) -> G1Affine {
    (G1Projective::generator() * Fr::rand(rng)).into_affine()
}

/// Returns a random G2 point in the prime order subgroup.
pub fn random_g2<R: Rng>(rng: &mut R) -> G2Affine {
    (G2Projective::generator() * Fr::rand(rng)).into_affine()
}

/// Returns a G1 point on the curve but outside the prime order subgroup.
pub fn point_outside_subgroup_g1() -> G1Affine {
    (1u64..)
        .filter_map(|x| G1Affine::get_point_from_x_unchecked(Fq::from(x), false))
        .find(|point| !point.is_in_correct_subgroup_assuming_on_curve())
        .expect("the cofactor of G1 is not one")
}
