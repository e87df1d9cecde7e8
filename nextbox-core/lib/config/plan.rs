use std::time::Duration;

use bytes::Bytes;
use getset::{CopyGetters, Getters};
use typed_builder::TypedBuilder;

use crate::management::WEB_APP_SOURCE;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The base image the sandbox is created from.
pub const DEFAULT_BASE_IMAGE: &str = "node:20";

/// The directory the working directory is created from.
pub const DEFAULT_PARENT_DIR: &str = "/root";

/// The directory the Next.js application lives in.
pub const DEFAULT_APP_DIR: &str = "/root/web_app";

/// Scaffolds a Next.js application in the current directory, answering every prompt with its default.
pub const DEFAULT_BOOTSTRAP_COMMAND: &str = "yes \"\" | npx -y create-next-app@latest . --typescript --tailwind --eslint --app --no-git --import-alias '@/*'";

/// Initializes the shadcn component library with default settings.
pub const DEFAULT_UI_INIT_COMMAND: &str = "npx --yes shadcn@latest init -d";

/// The page overwritten with the injected source, relative to the application directory.
pub const DEFAULT_PAGE_PATH: &str = "app/page.tsx";

/// The session the dev server runs in.
pub const DEFAULT_SESSION_ID: &str = "node-dev";

/// The command that starts the dev server.
pub const DEFAULT_DEV_COMMAND: &str = "npm run dev";

/// The port the dev server listens on.
pub const DEFAULT_DEV_SERVER_PORT: u16 = 3000;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Resources requested for a new sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub with_prefix")]
pub struct Resources {
    /// Number of vCPUs.
    cpu: u32,

    /// Memory in GiB.
    memory: u32,

    /// Disk in GiB.
    disk: u32,
}

/// The immutable description of a provisioning run.
///
/// The default plan bootstraps a Next.js app with Tailwind and shadcn in `/root/web_app` of a
/// `node:20` sandbox, replaces `app/page.tsx` with the CRUD page and serves it on port 3000.
///
/// ## Example
/// ```
/// use std::time::Duration;
/// use nextbox_core::config::ProvisionPlan;
///
/// let plan = ProvisionPlan::builder()
///     .readiness_timeout(Duration::from_secs(30))
///     .build();
///
/// assert_eq!(plan.get_image(), "node:20");
/// assert_eq!(plan.page_file_path(), "/root/web_app/app/page.tsx");
/// ```
#[derive(Debug, Clone, Getters, CopyGetters, TypedBuilder)]
pub struct ProvisionPlan {
    /// The base image of the sandbox.
    #[builder(default = DEFAULT_BASE_IMAGE.to_string(), setter(into))]
    #[getset(get = "pub with_prefix")]
    image: String,

    /// The resources requested for the sandbox.
    #[builder(default = Resources::default())]
    #[getset(get_copy = "pub with_prefix")]
    resources: Resources,

    /// Minutes of inactivity before the provider stops the sandbox; zero disables auto-stop.
    #[builder(default = 0)]
    #[getset(get_copy = "pub with_prefix")]
    auto_stop_interval: u32,

    /// How long to wait for the provider to report the sandbox as started.
    #[builder(default = Duration::from_secs(180))]
    #[getset(get_copy = "pub with_prefix")]
    start_timeout: Duration,

    /// The directory the application directory is created from.
    #[builder(default = DEFAULT_PARENT_DIR.to_string(), setter(into))]
    #[getset(get = "pub with_prefix")]
    parent_dir: String,

    /// The application directory.
    #[builder(default = DEFAULT_APP_DIR.to_string(), setter(into))]
    #[getset(get = "pub with_prefix")]
    app_dir: String,

    /// The command that scaffolds the application.
    #[builder(default = DEFAULT_BOOTSTRAP_COMMAND.to_string(), setter(into))]
    #[getset(get = "pub with_prefix")]
    bootstrap_command: String,

    /// Timeout for the scaffold command.
    #[builder(default = Duration::from_secs(300))]
    #[getset(get_copy = "pub with_prefix")]
    bootstrap_timeout: Duration,

    /// The command that initializes the UI component library.
    #[builder(default = DEFAULT_UI_INIT_COMMAND.to_string(), setter(into))]
    #[getset(get = "pub with_prefix")]
    ui_init_command: String,

    /// Timeout for the UI component library initializer.
    #[builder(default = Duration::from_secs(300))]
    #[getset(get_copy = "pub with_prefix")]
    ui_init_timeout: Duration,

    /// The page to overwrite, relative to the application directory.
    #[builder(default = DEFAULT_PAGE_PATH.to_string(), setter(into))]
    #[getset(get = "pub with_prefix")]
    page_path: String,

    /// The exact bytes written to the page.
    #[builder(default = Bytes::from_static(WEB_APP_SOURCE.as_bytes()), setter(into))]
    #[getset(get = "pub with_prefix")]
    page_source: Bytes,

    /// The session the dev server is started in.
    #[builder(default = DEFAULT_SESSION_ID.to_string(), setter(into))]
    #[getset(get = "pub with_prefix")]
    session_id: String,

    /// The command that starts the dev server, run from the application directory.
    #[builder(default = DEFAULT_DEV_COMMAND.to_string(), setter(into))]
    #[getset(get = "pub with_prefix")]
    dev_command: String,

    /// The port the dev server listens on.
    #[builder(default = DEFAULT_DEV_SERVER_PORT)]
    #[getset(get_copy = "pub with_prefix")]
    port: u16,

    /// How long to wait for the dev server to accept connections.
    #[builder(default = Duration::from_secs(nextbox_utils::DEFAULT_READINESS_TIMEOUT_SECS))]
    #[getset(get_copy = "pub with_prefix")]
    readiness_timeout: Duration,

    /// The delay between two readiness probes.
    #[builder(default = Duration::from_secs(2))]
    #[getset(get_copy = "pub with_prefix")]
    readiness_poll_interval: Duration,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Resources {
    /// Creates a new resource request.
    pub fn new(cpu: u32, memory: u32, disk: u32) -> Self {
        Self { cpu, memory, disk }
    }
}

impl ProvisionPlan {
    /// The absolute path of the page inside the sandbox.
    pub fn page_file_path(&self) -> String {
        format!(
            "{}/{}",
            self.app_dir.trim_end_matches('/'),
            self.page_path.trim_start_matches('/')
        )
    }

    /// The full command run in the dev server session.
    pub fn dev_server_command(&self) -> String {
        format!("cd {} && {}", self.app_dir, self.dev_command)
    }

    /// A command that exits zero once something accepts TCP connections on the dev server port.
    pub fn readiness_probe_command(&self) -> String {
        format!(
            "node -e \"require('net').connect({}, '127.0.0.1').on('connect', () => process.exit(0)).on('error', () => process.exit(1))\"",
            self.port
        )
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Resources {
    fn default() -> Self {
        Self::new(2, 4, 8)
    }
}

impl Default for ProvisionPlan {
    fn default() -> Self {
        Self::builder().build()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
