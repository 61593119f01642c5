use crate::{Bls12_381, Fr, G1Affine, G1Projective, G2Affine};

use ark_bls12_381::g1;
use ark_ec::{
    hashing::{curve_maps::wb::WBMap, map_to_curve_hasher::MapToCurveBasedHasher, HashToCurve},
    pairing::Pairing,
    AffineRepr,
    CurveGroup,
};
use ark_ff::{field_hashers::DefaultFieldHasher, Field, PrimeField};
use rayon::prelude::*;
use sha2::Sha256;
use std::{
    ops::Range,
    sync::atomic::{AtomicUsize, Ordering},
};
use tracing::trace;

/// Domain separation tag for identity signatures.
pub const BLS_SIGNATURE_DST: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_POP_";

///
/// Returns `tau^start, tau^(start + 1), ..., tau^(end - 1)`.
///
pub fn generate_powers_of_tau(tau: &Fr, start: usize, end: usize) -> Vec<Fr> {
    let mut current = tau.pow([start as u64]);
    let mut powers = Vec::with_capacity(end.saturating_sub(start));
    for _ in start..end {
        powers.push(current);
        current *= tau;
    }
    powers
}

///
/// Multiplies every base by its matching exponent (and the optional
/// coefficient) in parallel, then normalizes the results in a single batch.
///
pub fn batch_exp<C: AffineRepr>(
    bases: &mut [C],
    exps: &[C::ScalarField],
    coeff: Option<&C::ScalarField>,
) -> Result<(), crate::Error> {
    if bases.len() != exps.len() {
        return Err(crate::Error::InvalidLength {
            expected: bases.len(),
            got: exps.len(),
        });
    }

    let projective: Vec<C::Group> = bases
        .par_iter()
        .zip(exps.par_iter())
        .map(|(base, exp)| {
            let exp = match coeff {
                Some(coeff) => *exp * coeff,
                None => *exp,
            };
            base.mul_bigint(exp.into_bigint())
        })
        .collect();

    let affine = C::Group::normalize_batch(&projective);
    bases.copy_from_slice(&affine);
    trace!("Exponentiated {} bases", bases.len());

    Ok(())
}

///
/// Checks that `g1.0 : g1.1` and `g2.0 : g2.1` share the same discrete log
/// ratio, that is `e(g1.0, g2.1) == e(g1.1, g2.0)`.
///
#[inline]
pub fn same_ratio(g1: &(G1Affine, G1Affine), g2: &(G2Affine, G2Affine)) -> bool {
    Bls12_381::pairing(g1.0, g2.1) == Bls12_381::pairing(g1.1, g2.0)
}

///
/// Runs `check` for every index in `range` on the rayon pool and returns
/// how many indices failed. Every index is always visited.
///
pub fn count_failures<F>(range: Range<usize>, check: F) -> usize
where
    F: Fn(usize) -> bool + Send + Sync,
{
    let failures = AtomicUsize::new(0);
    range.into_par_iter().for_each(|i| {
        if !check(i) {
            failures.fetch_add(1, Ordering::Relaxed);
        }
    });
    failures.into_inner()
}

///
/// Hashes `message` to a G1 point under [`BLS_SIGNATURE_DST`].
///
pub fn hash_to_g1(message: &[u8]) -> Result<G1Affine, crate::Error> {
    let hasher =
        MapToCurveBasedHasher::<G1Projective, DefaultFieldHasher<Sha256, 128>, WBMap<g1::Config>>::new(
            BLS_SIGNATURE_DST,
        )
        .map_err(|error| crate::Error::HashToCurve(error.to_string()))?;
    hasher
        .hash(message)
        .map_err(|error| crate::Error::HashToCurve(error.to_string()))
}

/// Signs `message` with `secret` as the BLS secret key.
pub fn sign_message(secret: &Fr, message: &[u8]) -> Result<G1Affine, crate::Error> {
    Ok(hash_to_g1(message)?.mul_bigint(secret.into_bigint()).into_affine())
}

///
/// Verifies a signature produced by [`sign_message`] against the public key
/// `h^secret`.
///
pub fn verify_signature(signature: &G1Affine, message: &[u8], pubkey: &G2Affine) -> bool {
    match hash_to_g1(message) {
        Ok(hash) => same_ratio(&(hash, *signature), &(G2Affine::generator(), *pubkey)),
        Err(_) => false,
    }
}
