use ceremony::{helpers::testing::secret_from_u64, verify_submission, Ceremony, Secret, VerificationError};
use setup_utils::{Fr, G1Affine, G2Affine};

use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, PrimeField};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

fn scaled_g1(exponent: &Fr) -> G1Affine {
    G1Affine::generator().mul_bigint(exponent.into_bigint()).into_affine()
}

fn scaled_g2(exponent: &Fr) -> G2Affine {
    G2Affine::generator().mul_bigint(exponent.into_bigint()).into_affine()
}

#[test]
fn test_four_by_two_contribution() -> anyhow::Result<()> {
    // Initialize a new ceremony with four G1 and two G2 powers.
    let old = Ceremony::new(&[(4, 2)])?;

    let mut rng = ChaChaRng::seed_from_u64(42);
    let secret = Secret::generate(&mut rng);
    let s = *secret.to_scalar()?;

    let new = old.clone().contribute_with_secret(&secret)?;
    let powers = &new.transcripts[0].powers_of_tau;

    // Check that every power was raised to the next power of the secret.
    for i in 0..4 {
        assert_eq!(scaled_g1(&s.pow([i as u64 + 1])), powers.g1_powers[i]);
    }
    for i in 0..2 {
        assert_eq!(scaled_g2(&s.pow([i as u64 + 1])), powers.g2_powers[i]);
    }

    // Check that the witness recorded the secret.
    let witness = &new.transcripts[0].witness;
    assert_eq!(vec![G1Affine::generator(), scaled_g1(&s)], witness.running_products);
    assert_eq!(vec![G2Affine::generator(), scaled_g2(&s)], witness.pot_pubkeys);

    assert_eq!(Ok(()), verify_submission(&old, &new));

    // Zeroing a single power must be rejected.
    let mut zeroed = new;
    zeroed.transcripts[0].powers_of_tau.g1_powers[2] = G1Affine::zero();
    assert!(matches!(
        verify_submission(&old, &zeroed),
        Err(VerificationError::PairingMismatch { transcript: 0, .. })
    ));

    Ok(())
}

#[test]
fn test_known_secret_contribution() -> anyhow::Result<()> {
    let old = Ceremony::new(&[(4, 2)])?;
    let new = old.clone().contribute_with_secret(&secret_from_u64(3))?;

    let expected = [3u64, 9, 27, 81]
        .iter()
        .map(|exponent| G1Affine::generator().mul_bigint([*exponent]).into_affine())
        .collect::<Vec<_>>();
    assert_eq!(expected, new.transcripts[0].powers_of_tau.g1_powers);
    assert_eq!(Ok(()), verify_submission(&old, &new));

    Ok(())
}
