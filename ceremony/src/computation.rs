use crate::{BatchContribution, Ceremony, CeremonyError, Contribution, PowersOfTau, Result, Transcript, Witness};
use setup_utils::{batch_exp, generate_powers_of_tau, sign_message, Fr, G1Affine, G2Affine, Secret};

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use itertools::Itertools;
use rand::{CryptoRng, Rng};
use tracing::{debug, info, info_span, trace};
use zeroize::Zeroizing;

/// Checks that the declared sizes match the stored powers.
fn check_powers(powers: &PowersOfTau, num_g1_powers: usize, num_g2_powers: usize) -> Result<()> {
    crate::initialization::check_sizes(num_g1_powers, num_g2_powers)?;

    if powers.g1_powers.len() != num_g1_powers || powers.g2_powers.len() != num_g2_powers {
        return Err(CeremonyError::InvalidPowers(format!(
            "declared {} G1 and {} G2 powers, found {} and {}",
            num_g1_powers,
            num_g2_powers,
            powers.g1_powers.len(),
            powers.g2_powers.len()
        )));
    }
    Ok(())
}

///
/// Multiplies `g1_powers[i]` and `g2_powers[i]` by `tau^(i + 1)`.
///
/// The scalar powers are computed up front, then both groups are updated in
/// parallel, one task per point. The scalar powers are wiped before returning.
///
fn apply_powers(powers: &mut PowersOfTau, tau: &Fr) -> Result<()> {
    let num_g2_powers = powers.g2_powers.len();
    let exponents = Zeroizing::new(generate_powers_of_tau(tau, 1, powers.g1_powers.len() + 1));
    trace!("generated {} powers of tau", exponents.len());

    let PowersOfTau { g1_powers, g2_powers } = powers;
    let (g1_result, g2_result) = rayon::join(
        || batch_exp(g1_powers, &exponents, None),
        || batch_exp(g2_powers, &exponents[..num_g2_powers], None),
    );
    g1_result?;
    g2_result?;

    trace!("applied powers to {} G1 and {} G2 elements", g1_powers.len(), g2_powers.len());
    Ok(())
}

/// Multiplies the powers by `tau^(i + 1)` one index at a time.
fn apply_powers_sequential(powers: &mut PowersOfTau, tau: &Fr) {
    let mut current = Zeroizing::new(*tau);
    for (index, g1) in powers.g1_powers.iter_mut().enumerate() {
        let exponent = current.into_bigint();
        *g1 = g1.mul_bigint(exponent).into_affine();
        if let Some(g2) = powers.g2_powers.get_mut(index) {
            *g2 = g2.mul_bigint(exponent).into_affine();
        }
        *current *= tau;
    }
}

/// Appends `running_products.last() * tau` and `h * tau`.
fn update_witness(witness: &mut Witness, tau: &Fr) -> Result<()> {
    let last = witness
        .running_products
        .last()
        .copied()
        .ok_or_else(|| CeremonyError::InvalidPowers("witness has no genesis entry".to_string()))?;

    witness.running_products.push(last.mul_bigint(tau.into_bigint()).into_affine());
    witness
        .pot_pubkeys
        .push(G2Affine::generator().mul_bigint(tau.into_bigint()).into_affine());
    Ok(())
}

impl Transcript {
    ///
    /// Folds `secret` into the transcript.
    ///
    /// Takes ownership of the transcript and returns the updated one, so a
    /// failed contribution never leaves a half updated transcript behind.
    /// Fails with `InvalidSecret` if the secret is zero or not a canonical
    /// scalar, and with `InvalidPowers` if the declared sizes do not match the
    /// stored powers.
    ///
    pub fn contribute(self, secret: &Secret) -> Result<Self> {
        let span = info_span!("transcript-contribution", g1 = self.num_g1_powers, g2 = self.num_g2_powers);
        let _guard = span.enter();

        let tau = secret.to_scalar()?;
        check_powers(&self.powers_of_tau, self.num_g1_powers, self.num_g2_powers)?;

        let mut transcript = self;
        apply_powers(&mut transcript.powers_of_tau, &tau)?;
        update_witness(&mut transcript.witness, &tau)?;

        debug!("contributed to transcript");
        Ok(transcript)
    }

    ///
    /// Folds `secret` into the transcript without any parallelism, keeping a
    /// single running power of the secret.
    ///
    /// Produces exactly the same transcript as [`Transcript::contribute`].
    ///
    pub fn contribute_sequential(self, secret: &Secret) -> Result<Self> {
        let tau = secret.to_scalar()?;
        check_powers(&self.powers_of_tau, self.num_g1_powers, self.num_g2_powers)?;

        let mut transcript = self;
        apply_powers_sequential(&mut transcript.powers_of_tau, &tau);
        update_witness(&mut transcript.witness, &tau)?;
        Ok(transcript)
    }
}

impl Ceremony {
    ///
    /// Contributes to every transcript with its own freshly generated secret.
    ///
    /// Each secret is overwritten with random bytes as soon as its transcript
    /// is updated and wiped from memory when dropped.
    ///
    pub fn contribute<R: Rng + CryptoRng>(self, rng: &mut R) -> Result<Self> {
        let span = info_span!("ceremony-contribution");
        let _guard = span.enter();

        info!("starting...");

        let Ceremony {
            transcripts,
            participant_ids,
            participant_ecdsa_signatures,
        } = self;

        let mut contributed = Vec::with_capacity(transcripts.len());
        for transcript in transcripts {
            let mut secret = Secret::generate(rng);
            contributed.push(transcript.contribute(&secret)?);
            secret.erase(rng);
        }

        info!("contributed to {} transcripts", contributed.len());

        Ok(Ceremony {
            transcripts: contributed,
            participant_ids,
            participant_ecdsa_signatures,
        })
    }

    /// Contributes to every transcript with the same secret.
    pub fn contribute_with_secret(self, secret: &Secret) -> Result<Self> {
        let span = info_span!("ceremony-contribution");
        let _guard = span.enter();

        let Ceremony {
            transcripts,
            participant_ids,
            participant_ecdsa_signatures,
        } = self;

        let transcripts = transcripts
            .into_iter()
            .map(|transcript| transcript.contribute(secret))
            .collect::<Result<Vec<_>>>()?;

        Ok(Ceremony {
            transcripts,
            participant_ids,
            participant_ecdsa_signatures,
        })
    }
}

impl Contribution {
    ///
    /// Folds `secret` into the powers and replaces the public key with
    /// `h^secret`.
    ///
    /// When an identity is given it is signed with the secret, otherwise the
    /// signature is the point at infinity.
    ///
    pub fn contribute(self, secret: &Secret, identity: Option<&str>) -> Result<Self> {
        let tau = secret.to_scalar()?;
        check_powers(&self.powers_of_tau, self.num_g1_powers, self.num_g2_powers)?;

        let mut contribution = self;
        apply_powers(&mut contribution.powers_of_tau, &tau)?;
        contribution.pot_pubkey = G2Affine::generator().mul_bigint(tau.into_bigint()).into_affine();
        contribution.bls_signature = match identity {
            Some(identity) => sign_message(&tau, identity.as_bytes())?,
            None => G1Affine::zero(),
        };

        Ok(contribution)
    }
}

impl BatchContribution {
    /// Contributes to every contribution with its own freshly generated secret.
    pub fn contribute<R: Rng + CryptoRng>(self, rng: &mut R, identity: Option<&str>) -> Result<Self> {
        let span = info_span!("batch-contribution");
        let _guard = span.enter();

        info!("starting...");

        let mut contributions = Vec::with_capacity(self.contributions.len());
        for (index, contribution) in self.contributions.into_iter().enumerate() {
            let mut secret = Secret::generate(rng);
            contributions.push(contribution.contribute(&secret, identity)?);
            secret.erase(rng);
            debug!("contributed to contribution {}", index);
        }

        Ok(Self { contributions })
    }

    /// Returns the public keys of the latest secrets, one per contribution.
    pub fn pot_pubkeys(&self) -> Vec<G2Affine> {
        self.contributions.iter().map(|c| c.pot_pubkey).collect_vec()
    }
}
