use crate::{BatchContribution, Ceremony, CeremonyError, Contribution, PowersOfTau, Result, Transcript, Witness};
use setup_utils::{G1Affine, G2Affine};

use ark_ec::AffineRepr;
use tracing::{debug, info, info_span};

/// Checks that the requested sizes describe a usable transcript.
pub(crate) fn check_sizes(num_g1_powers: usize, num_g2_powers: usize) -> Result<()> {
    if num_g1_powers < 1 || num_g2_powers < 1 {
        return Err(CeremonyError::InvalidPowers(format!(
            "at least one power is required, got {} G1 and {} G2",
            num_g1_powers, num_g2_powers
        )));
    }
    if num_g2_powers > num_g1_powers {
        return Err(CeremonyError::InvalidPowers(format!(
            "{} G2 powers exceed {} G1 powers",
            num_g2_powers, num_g1_powers
        )));
    }
    Ok(())
}

impl PowersOfTau {
    /// Returns the powers of `τ = 1`, every entry being the group generator.
    pub fn new(num_g1_powers: usize, num_g2_powers: usize) -> Self {
        Self {
            g1_powers: vec![G1Affine::generator(); num_g1_powers],
            g2_powers: vec![G2Affine::generator(); num_g2_powers],
        }
    }
}

impl Default for Witness {
    /// Returns the genesis witness `([g], [h])`.
    fn default() -> Self {
        Self {
            running_products: vec![G1Affine::generator()],
            pot_pubkeys: vec![G2Affine::generator()],
        }
    }
}

impl Transcript {
    ///
    /// Returns the genesis transcript for the given sizes.
    ///
    /// Fails if either size is zero or if there are more G2 powers than G1
    /// powers.
    ///
    pub fn new(num_g1_powers: usize, num_g2_powers: usize) -> Result<Self> {
        check_sizes(num_g1_powers, num_g2_powers)?;

        Ok(Self {
            num_g1_powers,
            num_g2_powers,
            powers_of_tau: PowersOfTau::new(num_g1_powers, num_g2_powers),
            witness: Witness::default(),
        })
    }
}

impl Ceremony {
    ///
    /// Returns the genesis ceremony with one transcript per `(num_g1_powers,
    /// num_g2_powers)` pair, in the given order.
    ///
    pub fn new(sizes: &[(usize, usize)]) -> Result<Self> {
        let span = info_span!("ceremony-initialization");
        let _guard = span.enter();

        info!("starting...");

        let transcripts = sizes
            .iter()
            .map(|(num_g1_powers, num_g2_powers)| {
                debug!("initializing transcript with {} G1 and {} G2 powers", num_g1_powers, num_g2_powers);
                Transcript::new(*num_g1_powers, *num_g2_powers)
            })
            .collect::<Result<Vec<_>>>()?;

        info!("initialized {} transcripts", transcripts.len());

        Ok(Self {
            transcripts,
            participant_ids: vec![],
            participant_ecdsa_signatures: vec![],
        })
    }
}

impl Contribution {
    /// Returns the genesis contribution for the given sizes.
    pub fn new(num_g1_powers: usize, num_g2_powers: usize) -> Result<Self> {
        check_sizes(num_g1_powers, num_g2_powers)?;

        Ok(Self {
            num_g1_powers,
            num_g2_powers,
            powers_of_tau: PowersOfTau::new(num_g1_powers, num_g2_powers),
            pot_pubkey: G2Affine::generator(),
            bls_signature: G1Affine::zero(),
        })
    }
}

impl BatchContribution {
    /// Returns the genesis batch with one contribution per size pair.
    pub fn new(sizes: &[(usize, usize)]) -> Result<Self> {
        let contributions = sizes
            .iter()
            .map(|(num_g1_powers, num_g2_powers)| Contribution::new(*num_g1_powers, *num_g2_powers))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { contributions })
    }
}

impl From<&Ceremony> for BatchContribution {
    /// Projects the ceremony onto the batch format, carrying the latest
    /// public key of every transcript.
    fn from(ceremony: &Ceremony) -> Self {
        let contributions = ceremony
            .transcripts
            .iter()
            .map(|transcript| Contribution {
                num_g1_powers: transcript.num_g1_powers,
                num_g2_powers: transcript.num_g2_powers,
                powers_of_tau: transcript.powers_of_tau.clone(),
                pot_pubkey: transcript
                    .witness
                    .pot_pubkeys
                    .last()
                    .copied()
                    .unwrap_or_else(G2Affine::generator),
                bls_signature: G1Affine::zero(),
            })
            .collect();

        Self { contributions }
    }
}
