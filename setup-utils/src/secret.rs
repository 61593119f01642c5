use crate::Fr;

use ark_ff::{BigInt, BigInteger, PrimeField, UniformRand, Zero};
use rand::{CryptoRng, Rng};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// Size in bytes of an encoded secret.
pub const SECRET_SIZE: usize = 32;

///
/// A contribution secret held as 32 big-endian bytes.
///
/// The bytes are wiped when the secret is dropped and are never printed.
///
#[derive(Clone)]
pub struct Secret(Zeroizing<[u8; SECRET_SIZE]>);

impl Secret {
    /// Wraps the given big-endian bytes.
    #[inline]
    pub fn from_bytes(bytes: [u8; SECRET_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    ///
    /// Samples a uniformly random non-zero scalar and returns its
    /// big-endian encoding.
    ///
    pub fn generate<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut scalar = loop {
            let candidate = Fr::rand(rng);
            if !candidate.is_zero() {
                break candidate;
            }
        };

        let mut encoded = scalar.into_bigint().to_bytes_be();
        let mut bytes = [0u8; SECRET_SIZE];
        bytes[SECRET_SIZE - encoded.len()..].copy_from_slice(&encoded);

        encoded.zeroize();
        scalar.zeroize();
        Self::from_bytes(bytes)
    }

    /// Returns the raw big-endian bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; SECRET_SIZE] {
        &self.0
    }

    ///
    /// Decodes the secret into a scalar.
    ///
    /// Fails if the bytes are not a canonical encoding below the group order,
    /// or if they encode zero.
    ///
    pub fn to_scalar(&self) -> Result<Zeroizing<Fr>, crate::Error> {
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(self.0.rchunks(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *limb = u64::from_be_bytes(word);
            word.zeroize();
        }

        let scalar = Fr::from_bigint(BigInt::new(limbs));
        limbs.zeroize();

        match scalar {
            Some(scalar) if !scalar.is_zero() => Ok(Zeroizing::new(scalar)),
            _ => Err(crate::Error::InvalidSecret),
        }
    }

    /// Overwrites the secret with fresh random bytes.
    pub fn erase<R: Rng>(&mut self, rng: &mut R) {
        rng.fill(&mut self.0[..]);
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Secret(<redacted>)")
    }
}
