use setup_utils::ElementType;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CeremonyError {
    #[error("Secret does not decode to a non-zero scalar")]
    InvalidSecret,

    #[error("Invalid powers: {0}")]
    InvalidPowers(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("{0}")]
    Utils(setup_utils::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl From<setup_utils::Error> for CeremonyError {
    fn from(error: setup_utils::Error) -> Self {
        match error {
            setup_utils::Error::InvalidSecret => CeremonyError::InvalidSecret,
            error => CeremonyError::Utils(error),
        }
    }
}

/// The reason a candidate state was rejected. Every variant names the
/// transcript (or contribution) index it was detected in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Transcript {transcript} did not grow its {element} list ({previous} -> {next} entries)")]
    Growth {
        transcript: usize,
        element: ElementType,
        previous: usize,
        next: usize,
    },

    #[error("Expected {expected} transcripts, found {found}")]
    TranscriptCountMismatch { expected: usize, found: usize },

    #[error("Transcript {transcript} has {element} {index} at infinity")]
    ZeroPoint {
        transcript: usize,
        element: ElementType,
        index: usize,
    },

    #[error("Transcript {transcript} has {element} {index} outside the prime order subgroup")]
    Subgroup {
        transcript: usize,
        element: ElementType,
        index: usize,
    },

    #[error("Transcript {transcript} does not extend the previous {element} history")]
    Continuity { transcript: usize, element: ElementType },

    #[error("Transcript {transcript} repeats {element} {index}")]
    DuplicatePubkey {
        transcript: usize,
        element: ElementType,
        index: usize,
    },

    #[error("Transcript {transcript} has {num_g1_powers} G1 and {num_g2_powers} G2 powers, at least 2 of each are required")]
    InsufficientPowers {
        transcript: usize,
        num_g1_powers: usize,
        num_g2_powers: usize,
    },

    #[error("Transcript {transcript} expects {expected} of {element}, found {found}")]
    PowersLengthMismatch {
        transcript: usize,
        element: ElementType,
        expected: usize,
        found: usize,
    },

    #[error("Transcript {transcript} failed {failures} {element} pairing checks")]
    PairingMismatch {
        transcript: usize,
        element: ElementType,
        failures: usize,
    },

    #[error("Contribution {transcript} carries an invalid {element}")]
    InvalidSignature { transcript: usize, element: ElementType },

    #[error("Transcript {transcript} has a {element} that is not bound to its latest running product")]
    Unbound { transcript: usize, element: ElementType },

    #[error("Transcript {transcript} could not scan its {element} list: {reason}")]
    Scan {
        transcript: usize,
        element: ElementType,
        reason: String,
    },
}
