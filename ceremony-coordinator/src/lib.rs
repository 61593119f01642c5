//! The coordinator of the Powers of Tau ceremony.
//!
//! Participants register for a time slot, retrieve the canonical ceremony
//! once their slot is current, and submit their contribution before the slot
//! deadline. Accepted contributions are persisted under their slot index
//! before they become canonical. The HTTP layer in front of the coordinator
//! maps every [`CoordinatorError`] to [`CoordinatorError::status_code`].

pub mod clock;

pub mod coordinator;
pub use coordinator::*;

pub mod environment;

mod logger;
pub use logger::initialize_logger;

pub mod objects;

pub mod storage;
pub use storage::Storage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod tests;
