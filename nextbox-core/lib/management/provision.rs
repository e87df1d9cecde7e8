//! The sandbox provisioning sequence.
//!
//! A run goes through these steps, each one only after the previous succeeded:
//! 1. connect to the provider (the provider client carries the credentials)
//! 2. create a sandbox from the base image and wait for it to start
//! 3. make its previews public
//! 4. create the application directory
//! 5. scaffold a Next.js application
//! 6. initialize the shadcn component library
//! 7. overwrite the landing page with the CRUD page
//! 8. start the dev server in a detached session
//! 9. wait until the dev server accepts connections
//! 10. resolve the preview URL of the dev server port
//!
//! Failures are returned as they are. Nothing is rolled back, so a sandbox that fails halfway
//! keeps running on the provider.

use serde::Serialize;
use tokio::time::Instant;

use crate::{
    config::ProvisionPlan,
    provider::{CreateSandboxParams, ExecuteRequest, SandboxProvider, SessionExecuteRequest},
    NextboxError, NextboxResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const TOTAL_STEPS: u8 = 10;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedSandbox {
    /// The public URL of the running dev server.
    pub frontend_url: String,

    /// The provider's sandbox identifier.
    pub sandbox_id: String,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Provisions a new sandbox running the CRUD Next.js app and returns its preview URL.
///
/// ## Arguments
/// * `provider` - The provider the sandbox is created on
/// * `plan` - What to create and how long to wait for each step
///
/// ## Example
/// ```no_run
/// use nextbox_core::{
///     config::{ProviderConfig, ProvisionPlan},
///     management::provision,
///     provider::DaytonaProvider,
/// };
///
/// # async fn example() -> nextbox_core::NextboxResult<()> {
/// let config = ProviderConfig::new("dtn_key", "https://app.daytona.io/api")?;
/// let provider = DaytonaProvider::new(config)?;
///
/// let sandbox = provision(&provider, &ProvisionPlan::default()).await?;
/// println!("{} is serving {}", sandbox.sandbox_id, sandbox.frontend_url);
/// # Ok(())
/// # }
/// ```
pub async fn provision<P>(provider: &P, plan: &ProvisionPlan) -> NextboxResult<ProvisionedSandbox>
where
    P: SandboxProvider + ?Sized,
{
    step(1, "Connecting to sandbox provider");

    step(2, "Creating sandbox");
    let params = CreateSandboxParams {
        image: plan.get_image().clone(),
        resources: plan.get_resources(),
        auto_stop_interval: plan.get_auto_stop_interval(),
        start_timeout: plan.get_start_timeout(),
    };
    let sandbox = provider.create_sandbox(&params).await?;
    let id = sandbox.id.as_str();
    tracing::info!(sandbox = %id, "sandbox started");

    step(3, "Making sandbox public");
    provider.set_public(id, true).await?;

    step(4, "Creating application directory");
    run(
        provider,
        id,
        ExecuteRequest::new(format!("mkdir -p {}", plan.get_app_dir())).cwd(plan.get_parent_dir()),
    )
    .await?;

    step(5, "Installing Next.js (this may take a few minutes)");
    run(
        provider,
        id,
        ExecuteRequest::new(plan.get_bootstrap_command())
            .cwd(plan.get_app_dir())
            .timeout(plan.get_bootstrap_timeout()),
    )
    .await?;

    step(6, "Installing shadcn");
    run(
        provider,
        id,
        ExecuteRequest::new(plan.get_ui_init_command())
            .cwd(plan.get_app_dir())
            .timeout(plan.get_ui_init_timeout()),
    )
    .await?;

    step(7, "Writing CRUD page");
    provider
        .upload_file(id, &plan.page_file_path(), plan.get_page_source().clone())
        .await?;

    step(8, "Starting dev server");
    provider.create_session(id, plan.get_session_id()).await?;
    let started = provider
        .execute_session_command(
            id,
            plan.get_session_id(),
            &SessionExecuteRequest {
                command: plan.dev_server_command(),
                run_async: true,
            },
        )
        .await?;
    tracing::debug!(sandbox = %id, cmd_id = ?started.cmd_id, "dev server command submitted");

    step(9, "Waiting for dev server to accept connections");
    wait_for_dev_server(provider, id, plan).await?;

    step(10, "Resolving preview link");
    let preview = provider.get_preview_link(id, plan.get_port()).await?;

    tracing::info!(sandbox = %id, url = %preview.url, "sandbox provisioned");
    Ok(ProvisionedSandbox {
        frontend_url: preview.url,
        sandbox_id: sandbox.id,
    })
}

/// Probes the dev server port from inside the sandbox until it accepts a connection.
///
/// Returns [`NextboxError::Timeout`] when the readiness timeout elapses first. Errors from the
/// provider itself end the wait immediately.
pub async fn wait_for_dev_server<P>(
    provider: &P,
    sandbox_id: &str,
    plan: &ProvisionPlan,
) -> NextboxResult<()>
where
    P: SandboxProvider + ?Sized,
{
    let probe = ExecuteRequest::new(plan.readiness_probe_command())
        .timeout(plan.get_readiness_poll_interval().max(std::time::Duration::from_secs(1)));
    let deadline = Instant::now() + plan.get_readiness_timeout();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let response = provider.execute_command(sandbox_id, &probe).await?;
        if response.exit_code == 0 {
            tracing::debug!(sandbox = %sandbox_id, attempts, "dev server is listening");
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(NextboxError::Timeout(format!(
                "dev server in sandbox {} did not listen on port {} within {}s",
                sandbox_id,
                plan.get_port(),
                plan.get_readiness_timeout().as_secs()
            )));
        }

        tracing::debug!(sandbox = %sandbox_id, attempts, "dev server not listening yet");
        tokio::time::sleep(plan.get_readiness_poll_interval()).await;
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn step(n: u8, message: &str) {
    tracing::info!("[{}/{}] {}...", n, TOTAL_STEPS, message);
}

async fn run<P>(provider: &P, sandbox_id: &str, request: ExecuteRequest) -> NextboxResult<()>
where
    P: SandboxProvider + ?Sized,
{
    provider
        .execute_command(sandbox_id, &request)
        .await?
        .check(&request.command)?;
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
