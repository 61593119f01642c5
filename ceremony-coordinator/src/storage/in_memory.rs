use crate::{environment::Environment, storage::Storage, CoordinatorError};

use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct InMemory {
    history: BTreeMap<u64, Vec<u8>>,
}

impl Storage for InMemory {
    /// Loads a new instance of `InMemory`.
    #[inline]
    fn load(_: &Environment) -> Result<Self, CoordinatorError> {
        Ok(Self::default())
    }

    #[inline]
    fn get(&self, index: u64) -> Result<Option<Vec<u8>>, CoordinatorError> {
        Ok(self.history.get(&index).cloned())
    }

    #[inline]
    fn insert(&mut self, index: u64, body: &[u8]) -> Result<(), CoordinatorError> {
        self.history.insert(index, body.to_vec());
        Ok(())
    }

    #[inline]
    fn indices(&self) -> Result<Vec<u64>, CoordinatorError> {
        Ok(self.history.keys().copied().collect())
    }
}
