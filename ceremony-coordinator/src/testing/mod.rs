mod coordinator;
pub use coordinator::*;

pub mod prelude;
