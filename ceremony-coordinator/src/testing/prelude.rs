pub use super::coordinator::*;
pub use crate::clock::Clock;

#[cfg(test)]
pub use serial_test::serial;
