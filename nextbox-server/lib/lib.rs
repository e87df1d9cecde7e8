//! Nextbox Server - provisions Next.js development sandboxes over HTTP.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod payload;
pub mod proxy;
pub mod route;
pub mod state;


//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use config::*;
pub use error::*;
pub use handler::*;
pub use middleware::*;
pub use payload::*;
pub use route::*;
pub use state::*;
