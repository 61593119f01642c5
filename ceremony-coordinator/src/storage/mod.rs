mod disk;
pub use disk::*;

mod in_memory;
pub use in_memory::*;

#[allow(clippy::module_inception)]
mod storage;
pub use storage::*;
