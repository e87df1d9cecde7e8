//! Provisioning of Next.js development sandboxes.

mod payload;
pub mod provision;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use payload::*;
pub use provision::*;
