//! Names of the environment variables read by nextbox.

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Environment variable for the origin allowed by CORS
pub const FRONTEND_URL_ENV_VAR: &str = "FRONTEND_URL";

/// Environment variable for the Daytona API key
pub const DAYTONA_API_KEY_ENV_VAR: &str = "DAYTONA_API_KEY";

/// Environment variable for the Daytona API base URL
pub const DAYTONA_API_URL_ENV_VAR: &str = "DAYTONA_API_URL";

/// Environment variable for the address the server binds to
pub const NEXTBOX_HOST_ENV_VAR: &str = "NEXTBOX_HOST";

/// Environment variable for the port the server listens on
pub const NEXTBOX_PORT_ENV_VAR: &str = "NEXTBOX_PORT";

/// Environment variable for the dev server readiness timeout in seconds
pub const NEXTBOX_READINESS_TIMEOUT_ENV_VAR: &str = "NEXTBOX_READINESS_TIMEOUT";
