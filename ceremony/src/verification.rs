use crate::{BatchContribution, Ceremony, Contribution, PowersOfTau, Transcript, VerificationError, Witness};
use setup_utils::{
    check_non_zero,
    check_subgroup,
    count_failures,
    same_ratio,
    verify_signature,
    ElementType,
    G1Affine,
    G2Affine,
};

use ark_ec::AffineRepr;
use std::collections::HashSet;
use tracing::{debug, error, info, info_span, trace};

type Result<T> = std::result::Result<T, VerificationError>;

fn subgroup<C: AffineRepr>(transcript: usize, element: ElementType, points: &[C]) -> Result<()> {
    subgroup_outcome(transcript, element, check_subgroup(points))
}

fn non_zero<C: AffineRepr>(transcript: usize, element: ElementType, points: &[C]) -> Result<()> {
    non_zero_outcome(transcript, element, check_non_zero(points))
}

/// Maps the subgroup scan of one element list onto the transcript. Only a
/// clean scan passes.
fn subgroup_outcome(transcript: usize, element: ElementType, outcome: setup_utils::Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(setup_utils::Error::IncorrectSubgroup { index }) => Err(VerificationError::Subgroup {
            transcript,
            element,
            index,
        }),
        Err(error) => Err(scan_failure(transcript, element, error)),
    }
}

/// Maps the infinity scan of one element list onto the transcript. Only a
/// clean scan passes.
fn non_zero_outcome(transcript: usize, element: ElementType, outcome: setup_utils::Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(setup_utils::Error::PointAtInfinity { index }) => Err(VerificationError::ZeroPoint {
            transcript,
            element,
            index,
        }),
        Err(error) => Err(scan_failure(transcript, element, error)),
    }
}

fn scan_failure(transcript: usize, element: ElementType, error: setup_utils::Error) -> VerificationError {
    VerificationError::Scan {
        transcript,
        element,
        reason: error.to_string(),
    }
}

///
/// Checks that every transcript of `next` strictly extends the witness of the
/// matching transcript in `previous` and keeps its sizes.
///
pub fn growth_check(previous: &Ceremony, next: &Ceremony) -> Result<()> {
    if previous.transcripts.len() != next.transcripts.len() {
        return Err(VerificationError::TranscriptCountMismatch {
            expected: previous.transcripts.len(),
            found: next.transcripts.len(),
        });
    }

    for (index, (before, after)) in previous.transcripts.iter().zip(&next.transcripts).enumerate() {
        let lists = [
            (
                ElementType::PotPubkey,
                before.witness.pot_pubkeys.len(),
                after.witness.pot_pubkeys.len(),
            ),
            (
                ElementType::RunningProduct,
                before.witness.running_products.len(),
                after.witness.running_products.len(),
            ),
        ];
        for (element, before_len, after_len) in lists {
            if after_len <= before_len {
                return Err(VerificationError::Growth {
                    transcript: index,
                    element,
                    previous: before_len,
                    next: after_len,
                });
            }
        }

        // A contribution may not change the shape of the transcript.
        let sizes = [
            (ElementType::G1Power, before.num_g1_powers, after.num_g1_powers),
            (ElementType::G2Power, before.num_g2_powers, after.num_g2_powers),
        ];
        for (element, expected, found) in sizes {
            if expected != found {
                return Err(VerificationError::PowersLengthMismatch {
                    transcript: index,
                    element,
                    expected,
                    found,
                });
            }
        }
    }

    Ok(())
}

/// Checks that no running product of any transcript is the point at infinity.
pub fn non_zero_check(ceremony: &Ceremony) -> Result<()> {
    for (index, transcript) in ceremony.transcripts.iter().enumerate() {
        non_zero(index, ElementType::RunningProduct, &transcript.witness.running_products)?;
    }
    Ok(())
}

/// Checks that the powers and witness of every transcript lie in the prime
/// order subgroups.
pub fn subgroup_check(ceremony: &Ceremony) -> Result<()> {
    for (index, transcript) in ceremony.transcripts.iter().enumerate() {
        powers_subgroup_check(index, &transcript.powers_of_tau)?;
        subgroup(index, ElementType::RunningProduct, &transcript.witness.running_products)?;
        subgroup(index, ElementType::PotPubkey, &transcript.witness.pot_pubkeys)?;
    }
    Ok(())
}

fn powers_subgroup_check(index: usize, powers: &PowersOfTau) -> Result<()> {
    subgroup(index, ElementType::G1Power, &powers.g1_powers)?;
    subgroup(index, ElementType::G2Power, &powers.g2_powers)
}

///
/// Checks that every witness list of `next` equals the matching list of
/// `previous` with exactly one entry appended.
///
pub fn witness_continuity_check(previous: &Ceremony, next: &Ceremony) -> Result<()> {
    fn extends<T: PartialEq>(previous: &[T], next: &[T]) -> bool {
        match next.split_last() {
            Some((_, prefix)) => prefix == previous,
            None => false,
        }
    }

    for (index, (before, after)) in previous.transcripts.iter().zip(&next.transcripts).enumerate() {
        let Witness {
            running_products,
            pot_pubkeys,
        } = &after.witness;

        if !extends(&before.witness.running_products, running_products) {
            return Err(VerificationError::Continuity {
                transcript: index,
                element: ElementType::RunningProduct,
            });
        }
        if !extends(&before.witness.pot_pubkeys, pot_pubkeys) {
            return Err(VerificationError::Continuity {
                transcript: index,
                element: ElementType::PotPubkey,
            });
        }
    }

    Ok(())
}

///
/// Checks that the public keys contributed to each transcript after its
/// genesis entry are pairwise distinct.
///
pub fn pubkey_uniqueness_check(ceremony: &Ceremony) -> Result<()> {
    for (index, transcript) in ceremony.transcripts.iter().enumerate() {
        let mut seen: HashSet<&G2Affine> = HashSet::with_capacity(transcript.witness.pot_pubkeys.len());
        for (position, pubkey) in transcript.witness.pot_pubkeys.iter().enumerate().skip(1) {
            if !seen.insert(pubkey) {
                return Err(VerificationError::DuplicatePubkey {
                    transcript: index,
                    element: ElementType::PotPubkey,
                    index: position,
                });
            }
        }
    }
    Ok(())
}

/// Checks that both declared sizes are at least two and match the stored powers.
fn powers_shape_check(index: usize, num_g1_powers: usize, num_g2_powers: usize, powers: &PowersOfTau) -> Result<()> {
    if num_g1_powers < 2 || num_g2_powers < 2 {
        return Err(VerificationError::InsufficientPowers {
            transcript: index,
            num_g1_powers,
            num_g2_powers,
        });
    }

    let lengths = [
        (ElementType::G1Power, num_g1_powers, powers.g1_powers.len()),
        (ElementType::G2Power, num_g2_powers, powers.g2_powers.len()),
    ];
    for (element, expected, found) in lengths {
        if expected != found {
            return Err(VerificationError::PowersLengthMismatch {
                transcript: index,
                element,
                expected,
                found,
            });
        }
    }

    Ok(())
}

///
/// Runs the pairing checks of one transcript. The G1 family, the G2 family and
/// the witness family each run on their own task, one check per index, and
/// every check runs to completion before the failures are reported.
///
fn transcript_pairing_check(index: usize, transcript: &Transcript) -> Result<()> {
    powers_shape_check(
        index,
        transcript.num_g1_powers,
        transcript.num_g2_powers,
        &transcript.powers_of_tau,
    )?;

    let Witness {
        running_products,
        pot_pubkeys,
    } = &transcript.witness;
    if running_products.len() != pot_pubkeys.len() {
        return Err(VerificationError::PowersLengthMismatch {
            transcript: index,
            element: ElementType::PotPubkey,
            expected: running_products.len(),
            found: pot_pubkeys.len(),
        });
    }

    let h = G2Affine::generator();
    let ((g1_failures, g2_failures), witness_failures) = rayon::join(
        || powers_pairing_failures(&transcript.powers_of_tau),
        || {
            count_failures(0..running_products.len().saturating_sub(1), |i| {
                same_ratio(&(running_products[i], running_products[i + 1]), &(h, pot_pubkeys[i + 1]))
            })
        },
    );

    report_failures(index, g1_failures, g2_failures)?;
    if witness_failures > 0 {
        return Err(VerificationError::PairingMismatch {
            transcript: index,
            element: ElementType::RunningProduct,
            failures: witness_failures,
        });
    }

    trace!("transcript {} pairing checks passed", index);
    Ok(())
}

///
/// Counts the failed checks of the two geometric progression families:
///
/// `e(g1[i], g2[1]) == e(g1[i + 1], g2[0])` and
/// `e(g1[1], g2[i]) == e(g1[0], g2[i + 1])`.
///
fn powers_pairing_failures(powers: &PowersOfTau) -> (usize, usize) {
    let PowersOfTau { g1_powers, g2_powers } = powers;
    let g1_ratio = (g1_powers[0], g1_powers[1]);
    let g2_ratio = (g2_powers[0], g2_powers[1]);

    let (mut g1_failures, mut g2_failures) = (0, 0);
    rayon::scope(|t| {
        t.spawn(|_| {
            g1_failures = count_failures(0..g1_powers.len() - 1, |i| {
                same_ratio(&(g1_powers[i], g1_powers[i + 1]), &g2_ratio)
            });
        });
        t.spawn(|_| {
            g2_failures = count_failures(0..g2_powers.len() - 1, |i| {
                same_ratio(&g1_ratio, &(g2_powers[i], g2_powers[i + 1]))
            });
        });
    });

    (g1_failures, g2_failures)
}

fn report_failures(index: usize, g1_failures: usize, g2_failures: usize) -> Result<()> {
    if g1_failures > 0 {
        return Err(VerificationError::PairingMismatch {
            transcript: index,
            element: ElementType::G1Power,
            failures: g1_failures,
        });
    }
    if g2_failures > 0 {
        return Err(VerificationError::PairingMismatch {
            transcript: index,
            element: ElementType::G2Power,
            failures: g2_failures,
        });
    }
    Ok(())
}

/// Runs the pairing checks of every transcript.
pub fn pairing_check(ceremony: &Ceremony) -> Result<()> {
    for (index, transcript) in ceremony.transcripts.iter().enumerate() {
        transcript_pairing_check(index, transcript)?;
    }
    Ok(())
}

///
/// Ties the powers of one transcript to its witness. The progression checks
/// only fix the ratio between consecutive powers, so three more equalities
/// pin the powers to the accumulated secret `t` of the running products:
///
/// `g1[0] == running_products.last()`,
/// `e(g1[0], h) == e(g, g2[0])` and
/// `e(g1[1], h) == e(g1[0], g2[0])`.
///
fn transcript_binding_check(index: usize, transcript: &Transcript) -> Result<()> {
    powers_shape_check(
        index,
        transcript.num_g1_powers,
        transcript.num_g2_powers,
        &transcript.powers_of_tau,
    )?;

    let PowersOfTau { g1_powers, g2_powers } = &transcript.powers_of_tau;
    if transcript.witness.running_products.last() != Some(&g1_powers[0]) {
        return Err(VerificationError::Unbound {
            transcript: index,
            element: ElementType::RunningProduct,
        });
    }

    let (g, h) = (G1Affine::generator(), G2Affine::generator());
    let (g2_linked, g1_squared) = rayon::join(
        || same_ratio(&(g, g1_powers[0]), &(h, g2_powers[0])),
        || same_ratio(&(g1_powers[0], g1_powers[1]), &(h, g2_powers[0])),
    );
    if !g2_linked {
        return Err(VerificationError::Unbound {
            transcript: index,
            element: ElementType::G2Power,
        });
    }
    if !g1_squared {
        return Err(VerificationError::Unbound {
            transcript: index,
            element: ElementType::G1Power,
        });
    }

    trace!("transcript {} is bound to its witness", index);
    Ok(())
}

/// Checks that the powers of every transcript are built from the secret its
/// running products accumulate.
pub fn binding_check(ceremony: &Ceremony) -> Result<()> {
    for (index, transcript) in ceremony.transcripts.iter().enumerate() {
        transcript_binding_check(index, transcript)?;
    }
    Ok(())
}

///
/// Decides whether `next` is a valid contribution on top of `previous`.
///
/// The checks run from cheapest to most expensive and stop at the first
/// failing category: growth, non-zero, subgroup, witness continuity, pubkey
/// uniqueness, pairings, then the binding of the powers to the witness.
///
pub fn verify_submission(previous: &Ceremony, next: &Ceremony) -> Result<()> {
    let span = info_span!("ceremony-verification");
    let _guard = span.enter();

    info!("starting...");

    let checks: [(&str, &dyn Fn() -> Result<()>); 7] = [
        ("growth", &|| growth_check(previous, next)),
        ("non-zero", &|| non_zero_check(next)),
        ("subgroup", &|| subgroup_check(next)),
        ("witness continuity", &|| witness_continuity_check(previous, next)),
        ("pubkey uniqueness", &|| pubkey_uniqueness_check(next)),
        ("pairing", &|| pairing_check(next)),
        ("binding", &|| binding_check(next)),
    ];
    for (name, check) in checks {
        if let Err(error) = check() {
            error!("{} check failed: {}", name, error);
            return Err(error);
        }
        debug!("{} check passed", name);
    }

    info!("ceremony verification complete");
    Ok(())
}

///
/// Audits a single ceremony state on its own, for example one loaded from the
/// contribution history.
///
pub fn verify_ceremony(ceremony: &Ceremony) -> Result<()> {
    let span = info_span!("ceremony-audit");
    let _guard = span.enter();

    info!("starting...");

    non_zero_check(ceremony)?;
    subgroup_check(ceremony)?;
    pubkey_uniqueness_check(ceremony)?;
    pairing_check(ceremony)?;
    binding_check(ceremony)?;

    info!("ceremony audit complete");
    Ok(())
}

impl BatchContribution {
    /// Checks that every point of every contribution lies in its prime order
    /// subgroup.
    pub fn subgroup_checks(&self) -> Result<()> {
        for (index, contribution) in self.contributions.iter().enumerate() {
            powers_subgroup_check(index, &contribution.powers_of_tau)?;
            subgroup(index, ElementType::PotPubkey, std::slice::from_ref(&contribution.pot_pubkey))?;
            subgroup(
                index,
                ElementType::BlsSignature,
                std::slice::from_ref(&contribution.bls_signature),
            )?;
        }
        Ok(())
    }
}

/// Checks that `next` multiplied the powers of `previous` by the secret
/// behind its public key: `e(next.g1[0], h) == e(previous.g1[0], pot_pubkey)`.
fn tau_update_check(index: usize, previous: &Contribution, next: &Contribution) -> Result<()> {
    let h = G2Affine::generator();
    let before = previous.powers_of_tau.g1_powers[0];
    let after = next.powers_of_tau.g1_powers[0];

    match same_ratio(&(before, after), &(h, next.pot_pubkey)) {
        true => Ok(()),
        false => Err(VerificationError::PairingMismatch {
            transcript: index,
            element: ElementType::PotPubkey,
            failures: 1,
        }),
    }
}

///
/// Decides whether `next` is a valid batch contribution on top of `previous`.
///
/// Every contribution must keep its sizes, lie in the prime order subgroups,
/// carry consistent powers, and be linked to the previous powers through its
/// public key. When an identity is given, every signature must verify
/// against it.
///
pub fn verify_batch_contribution(
    previous: &BatchContribution,
    next: &BatchContribution,
    identity: Option<&str>,
) -> Result<()> {
    let span = info_span!("batch-verification");
    let _guard = span.enter();

    info!("starting...");

    if previous.contributions.len() != next.contributions.len() {
        return Err(VerificationError::TranscriptCountMismatch {
            expected: previous.contributions.len(),
            found: next.contributions.len(),
        });
    }

    next.subgroup_checks()?;
    debug!("subgroup checks passed");

    for (index, (before, after)) in previous.contributions.iter().zip(&next.contributions).enumerate() {
        powers_shape_check(index, before.num_g1_powers, before.num_g2_powers, &before.powers_of_tau)?;
        powers_shape_check(index, after.num_g1_powers, after.num_g2_powers, &after.powers_of_tau)?;
        if before.num_g1_powers != after.num_g1_powers || before.num_g2_powers != after.num_g2_powers {
            return Err(VerificationError::PowersLengthMismatch {
                transcript: index,
                element: ElementType::G1Power,
                expected: before.num_g1_powers,
                found: after.num_g1_powers,
            });
        }

        non_zero(index, ElementType::PotPubkey, std::slice::from_ref(&after.pot_pubkey))?;

        let (g1_failures, g2_failures) = powers_pairing_failures(&after.powers_of_tau);
        report_failures(index, g1_failures, g2_failures)?;

        tau_update_check(index, before, after)?;

        if let Some(identity) = identity {
            if !verify_signature(&after.bls_signature, identity.as_bytes(), &after.pot_pubkey) {
                return Err(VerificationError::InvalidSignature {
                    transcript: index,
                    element: ElementType::BlsSignature,
                });
            }
        }
        trace!("contribution {} verified", index);
    }

    info!("batch verification complete");
    Ok(())
}
