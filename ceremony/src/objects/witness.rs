use setup_utils::{G1Affine, G2Affine};

///
/// The append-only proof trail of a transcript.
///
/// Entry `0` is the genesis pair `(g, h)`. Every contribution with secret `s`
/// appends `running_products.last() * s` and `h * s`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub running_products: Vec<G1Affine>,
    pub pot_pubkeys: Vec<G2Affine>,
}

impl Witness {
    /// Returns the number of entries, genesis included.
    #[inline]
    pub fn len(&self) -> usize {
        self.running_products.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.running_products.is_empty()
    }

    /// Returns the number of contributions folded in after genesis.
    #[inline]
    pub fn num_contributions(&self) -> usize {
        self.len().saturating_sub(1)
    }
}
