use crate::PowersOfTau;
use setup_utils::{G1Affine, G2Affine};

///
/// The batch variant of a transcript update.
///
/// Instead of a witness chain a contribution carries only the public key of
/// its latest secret, `h^s`, and an optional BLS signature of the contributor
/// identity under that secret. An unsigned contribution carries the point at
/// infinity as its signature.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub num_g1_powers: usize,
    pub num_g2_powers: usize,
    pub powers_of_tau: PowersOfTau,
    pub pot_pubkey: G2Affine,
    pub bls_signature: G1Affine,
}

/// An ordered set of contributions, one per setup size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchContribution {
    pub contributions: Vec<Contribution>,
}
