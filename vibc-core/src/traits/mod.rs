pub use log_source::*;

mod log_source;
