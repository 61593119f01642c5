use crate::{
    storage::{Disk, Storage},
    CoordinatorError,
};

use tracing::Level;

/// Transcript sizes of the production ceremony, as `(num_g1_powers, num_g2_powers)`.
const PRODUCTION_SIZES: [(usize, usize); 4] = [(4096, 65), (8192, 65), (16384, 65), (32768, 65)];

const DEVELOPMENT_SIZES: [(usize, usize); 2] = [(64, 8), (128, 8)];

const TEST_SIZES: [(usize, usize); 2] = [(4, 2), (8, 3)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Test,
    Development,
    Production,
}

impl Environment {
    /// Returns the `(num_g1_powers, num_g2_powers)` pair of every transcript.
    pub fn ceremony_sizes(&self) -> &'static [(usize, usize)] {
        match self {
            Environment::Test => &TEST_SIZES,
            Environment::Development => &DEVELOPMENT_SIZES,
            Environment::Production => &PRODUCTION_SIZES,
        }
    }

    /// Returns the number of seconds a participant has to contribute.
    pub fn participant_time(&self) -> i64 {
        match self {
            Environment::Test => 20,
            Environment::Development => 20,
            Environment::Production => 20,
        }
    }

    /// Returns the number of seconds reserved for verifying a submission.
    pub fn coordinator_time(&self) -> i64 {
        match self {
            Environment::Test => 120,
            Environment::Development => 60,
            Environment::Production => 120,
        }
    }

    /// Returns the delay before a slot that is current on registration opens.
    pub fn immediate_start_delay(&self) -> i64 {
        5
    }

    /// Returns the number of seconds waiting slots are deferred by when their
    /// start passes while an earlier slot still runs.
    pub fn pushback_delay(&self) -> i64 {
        10
    }

    pub fn verbosity(&self) -> Level {
        match self {
            Environment::Test => Level::TRACE,
            Environment::Development => Level::DEBUG,
            Environment::Production => Level::INFO,
        }
    }

    /// Returns the directory under which the ceremony history is stored.
    pub fn local_base_directory(&self) -> &'static str {
        match self {
            Environment::Test => "./transcript/test",
            Environment::Development => "./transcript/development",
            Environment::Production => "./transcript",
        }
    }

    /// Returns the disk storage of this environment.
    pub fn storage(&self) -> Result<Box<dyn Storage>, CoordinatorError> {
        Ok(Box::new(Disk::load(self)?))
    }
}
