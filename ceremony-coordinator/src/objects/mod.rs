mod responses;
pub use responses::*;

mod slot;
pub use slot::*;
