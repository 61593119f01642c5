mod ceremony;
pub use ceremony::*;

mod contribution;
pub use contribution::*;

mod powers_of_tau;
pub use powers_of_tau::*;

mod transcript;
pub use transcript::*;

mod witness;
pub use witness::*;
