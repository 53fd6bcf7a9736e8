// fsc3d Core - Domain types, ports and the 3DFSC job adapter
// NO process or OS dependencies (hexagonal: adapters live in fsc3d-infra-system)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AdapterError, Result};

/// Version of this adapter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
