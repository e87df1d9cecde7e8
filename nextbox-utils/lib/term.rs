//! Terminal styling helpers for CLI output.

use std::sync::LazyLock;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// A green checkmark used to mark completed steps.
pub static CHECKMARK: LazyLock<String> =
    LazyLock::new(|| format!("{}", console::style("✓").green()));

/// A red cross used to mark failed steps.
pub static ERROR_MARK: LazyLock<String> =
    LazyLock::new(|| format!("{}", console::style("✗").red()));
