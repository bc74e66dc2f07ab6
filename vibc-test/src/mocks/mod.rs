pub use log_source::MockChainLogSource;

mod log_source;
