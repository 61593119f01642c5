use crate::{clock::Clock, environment::Environment, storage::InMemory, Coordinator};
use ceremony::Ceremony;

use anyhow::{anyhow, Context};
use rand::rngs::OsRng;
use std::{
    path::Path,
    sync::{atomic::AtomicI64, atomic::Ordering, Arc},
};
use tracing::{error, info, warn};

pub const TEST_ENVIRONMENT: Environment = Environment::Test;

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn initialize_test_environment() {
    test_logger();
    clear_test_storage();
}

pub fn test_logger() {
    use once_cell::sync::OnceCell;
    use tracing::Level;

    static INSTANCE: OnceCell<()> = OnceCell::new();
    INSTANCE.get_or_init(|| {
        let subscriber = tracing_subscriber::fmt().with_max_level(Level::TRACE).finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            warn!("A global subscriber is already set");
        }
    });
}

/// Clears the transcript directory for testing purposes only.
pub fn clear_test_storage() {
    let path = TEST_ENVIRONMENT.local_base_directory();
    if Path::new(path).exists() {
        warn!("Coordinator is clearing {:?}", &path);
        match fs_err::remove_dir_all(path) {
            Ok(_) => (),
            Err(error) => error!(
                "The testing framework tried to clear the test transcript and failed. {}",
                error
            ),
        }
        warn!("Coordinator cleared {:?}", &path);
    }
}

/// Starts a test coordinator from genesis with in-memory history.
pub fn test_coordinator(clock: Arc<dyn Clock>) -> anyhow::Result<Coordinator> {
    info!("Starting coordinator");
    let coordinator = Coordinator::with_storage(TEST_ENVIRONMENT, Box::new(InMemory::default()), clock)?;
    info!("Coordinator is ready");
    Ok(coordinator)
}

/// Retrieves the canonical ceremony for `ticket` and returns a correctly
/// contributed body for it.
pub fn honest_submission(coordinator: &Coordinator, ticket: &str) -> anyhow::Result<Vec<u8>> {
    let response = coordinator.retrieve_participant(ticket)?;
    let json = response
        .ceremony
        .ok_or_else(|| anyhow!("slot of ticket {} is not current", ticket))?;

    let ceremony = Ceremony::from_json(&json)?;
    let contributed = ceremony.contribute(&mut OsRng).context("contribution failed")?;
    Ok(contributed.encode()?)
}
