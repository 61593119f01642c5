use crate::{PowersOfTau, Witness};

/// One setup size of the ceremony: its powers of tau and its witness chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub num_g1_powers: usize,
    pub num_g2_powers: usize,
    pub powers_of_tau: PowersOfTau,
    pub witness: Witness,
}
