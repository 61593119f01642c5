//! The Powers of Tau ceremony engine.
//!
//! A [`Ceremony`] holds one [`Transcript`] per supported setup size. Each
//! transcript carries powers `g^(τ^i)` and `h^(τ^i)` of a secret that no
//! single participant knows, plus a [`Witness`] chain proving that every
//! contributor folded their secret in correctly.
//!
//! Participants update a ceremony through [`Transcript::contribute`] (or the
//! ceremony level helpers) and the coordinator accepts the result only if
//! [`verify_submission`] succeeds against the previous state.

pub mod helpers;

pub mod objects;
pub use objects::*;

mod computation;

mod errors;
pub use errors::*;

mod initialization;

mod serialization;

mod verification;
pub use verification::*;

pub use setup_utils::{ElementType, Secret};

pub type Result<T> = std::result::Result<T, CeremonyError>;
