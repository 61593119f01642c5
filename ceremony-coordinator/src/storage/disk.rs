use crate::{environment::Environment, storage::Storage, CoordinatorError};

use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, trace, warn};

const HISTORY_DIRECTORY: &str = "history";

/// Stores every accepted ceremony as `{base}/history/{index}.json`.
#[derive(Debug)]
pub struct Disk {
    history_directory: PathBuf,
}

impl Disk {
    /// Opens the history directory under `base_directory`, creating it if needed.
    pub fn open(base_directory: impl AsRef<Path>) -> Result<Self, CoordinatorError> {
        let history_directory = base_directory.as_ref().join(HISTORY_DIRECTORY);
        fs_err::create_dir_all(&history_directory)?;
        debug!("Opened history at {}", history_directory.display());
        Ok(Self { history_directory })
    }

    #[inline]
    fn locator(&self, index: u64) -> PathBuf {
        self.history_directory.join(format!("{}.json", index))
    }
}

impl Storage for Disk {
    /// Loads a new instance of `Disk` under the environment's base directory.
    fn load(environment: &Environment) -> Result<Self, CoordinatorError> {
        Self::open(environment.local_base_directory())
    }

    fn get(&self, index: u64) -> Result<Option<Vec<u8>>, CoordinatorError> {
        let path = self.locator(index);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs_err::read(path)?))
    }

    /// Writes the body to a temporary file and renames it into place once synced.
    fn insert(&mut self, index: u64, body: &[u8]) -> Result<(), CoordinatorError> {
        let path = self.locator(index);
        let staging = self.history_directory.join(format!("{}.json.tmp", index));

        let mut file = fs_err::File::create(&staging)?;
        file.write_all(body)?;
        file.sync_all()?;
        fs_err::rename(&staging, &path)?;

        trace!("Stored {} bytes at {}", body.len(), path.display());
        Ok(())
    }

    fn indices(&self) -> Result<Vec<u64>, CoordinatorError> {
        let mut indices = vec![];
        for entry in fs_err::read_dir(&self.history_directory)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            match name.strip_suffix(".json").map(str::parse::<u64>) {
                Some(Ok(index)) => indices.push(index),
                _ => warn!("Skipping unexpected history entry {}", name),
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }
}
