use setup_utils::{G1Affine, G2Affine};

/// The powers `g^(τ^i)` and `h^(τ^i)` of the accumulated secret `τ`.
///
/// There are never more G2 powers than G1 powers, and entry `i` of both
/// lists carries the same exponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowersOfTau {
    pub g1_powers: Vec<G1Affine>,
    pub g2_powers: Vec<G2Affine>,
}
