pub mod catalog;
pub mod cop;
pub mod decode;
pub mod engine;
pub mod error;
pub mod feature;
pub mod firmware;
pub mod operating_mode;
pub mod session;
pub mod snapshot;
pub mod write_gate;
