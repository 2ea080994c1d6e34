pub mod aggregate;
pub mod classify;
pub mod evaluate;
pub mod samples;
pub mod targets;
pub mod util;

pub use aggregate::*;
pub use classify::*;
pub use evaluate::*;
pub use samples::*;
pub use targets::*;
pub use util::*;
