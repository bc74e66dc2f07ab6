pub use channel::*;
pub use lifecycle::*;
pub use log_meta::*;
pub use query::*;

mod channel;
mod lifecycle;
mod log_meta;
mod query;
