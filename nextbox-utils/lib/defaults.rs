//! Default values shared across the nextbox crates.

use std::net::{IpAddr, Ipv4Addr};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The default address the server binds to.
pub const DEFAULT_SERVER_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// The default port the server listens on.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// The default origin allowed to make cross-origin requests.
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// The default Daytona API base URL.
pub const DEFAULT_DAYTONA_API_URL: &str = "https://app.daytona.io/api";

/// The default time in seconds to wait for the dev server to start listening.
pub const DEFAULT_READINESS_TIMEOUT_SECS: u64 = 120;
