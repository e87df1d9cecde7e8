//! `nextbox-cli` contains the command line interface of the nextbox server.

#![warn(missing_docs)]

mod args;
mod error;
mod styles;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use args::*;
pub use error::*;
pub use styles::*;
