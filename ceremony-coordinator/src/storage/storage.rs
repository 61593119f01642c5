use crate::{environment::Environment, CoordinatorError};

/// Durable record of every accepted ceremony state, keyed by slot index.
pub trait Storage: Send + Sync {
    /// Loads a new instance of `Storage`.
    fn load(environment: &Environment) -> Result<Self, CoordinatorError>
    where
        Self: Sized;

    /// Returns the accepted body of the given slot, if one exists.
    fn get(&self, index: u64) -> Result<Option<Vec<u8>>, CoordinatorError>;

    /// Returns `true` if the given slot has an accepted body.
    fn contains_key(&self, index: u64) -> Result<bool, CoordinatorError> {
        Ok(self.get(index)?.is_some())
    }

    /// Persists the accepted body of the given slot.
    ///
    /// Must not return before the body is durable.
    fn insert(&mut self, index: u64, body: &[u8]) -> Result<(), CoordinatorError>;

    /// Returns the indices of all accepted slots in increasing order.
    fn indices(&self) -> Result<Vec<u64>, CoordinatorError>;

    /// Returns the most recently accepted slot and its body.
    fn latest(&self) -> Result<Option<(u64, Vec<u8>)>, CoordinatorError> {
        match self.indices()?.last() {
            Some(index) => match self.get(*index)? {
                Some(body) => Ok(Some((*index, body))),
                None => Err(CoordinatorError::HistoryMissing(*index)),
            },
            None => Ok(None),
        }
    }
}
