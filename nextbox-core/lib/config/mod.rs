//! Configuration types for provisioning.

mod plan;
mod provider;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use plan::*;
pub use provider::*;
