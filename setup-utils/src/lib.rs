//! Curve helpers shared by the ceremony engine and the coordinator.
//!
//! Everything in this crate is specialised to BLS12-381: points travel as
//! compressed ZCash-format encodings, scalars as 32 big-endian bytes.

mod elements;
pub use elements::*;

mod errors;
pub use errors::*;

mod helpers;
pub use helpers::*;

mod secret;
pub use secret::*;

pub use ark_bls12_381::{Bls12_381, Fq, Fr, G1Affine, G1Projective, G2Affine, G2Projective};

pub type Result<T> = std::result::Result<T, Error>;
