/*
[INPUT]:  CLI arguments, environment configuration, operator sign-in
[OUTPUT]: Todoist-import CSV file written to the requested path
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, environment variables, or startup flow
*/

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use mstodo_adapter::{DeviceAuthManager, GraphClient, DEFAULT_TENANT};
use mstodo_export::{run_export, ExportOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Azure AD application (client) id, delegated Tasks.Read permission required
const CLIENT_ID_ENV: &str = "MS_TODO_CLIENT_ID";
/// Tenant id, defaults to the shared multi-tenant endpoint
const TENANT_ID_ENV: &str = "MS_TODO_TENANT_ID";

#[derive(Parser, Debug)]
#[command(
    name = "mstodo-export",
    version,
    about = "Export Microsoft To Do tasks into a CSV compatible with Todoist import"
)]
struct Cli {
    /// Output CSV filename
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// Include completed tasks
    #[arg(long)]
    include_completed: bool,
    /// Do not export checklist items as separate tasks
    #[arg(long)]
    no_checklists: bool,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let client_id = env::var(CLIENT_ID_ENV)
        .map_err(|_| anyhow!("{CLIENT_ID_ENV} environment variable not set"))?;
    let tenant = env::var(TENANT_ID_ENV).unwrap_or_else(|_| DEFAULT_TENANT.to_string());

    info!(tenant = %tenant, output = %args.output.display(), "starting export");

    let mut client = GraphClient::new().context("build HTTP client")?;
    let auth = DeviceAuthManager::new(client.clone(), client_id.as_str(), tenant.as_str());

    let token = acquire_token(&auth).await?;
    client.set_bearer_token(token);

    let options = ExportOptions {
        include_completed: args.include_completed,
        include_checklists: !args.no_checklists,
    };
    let row_count = run_export(&client, &args.output, &options).await?;

    println!("Exported {} tasks to {}", row_count, args.output.display());
    Ok(())
}

/// Silent reuse first; on a miss, walk the operator through the
/// device-authorization flow and block until they complete it.
async fn acquire_token(auth: &DeviceAuthManager) -> Result<String> {
    if let Some(token) = auth.acquire_token_silent().await {
        return Ok(token);
    }

    let flow = auth
        .begin_device_flow()
        .await
        .context("start device-authorization flow")?;
    println!("To authenticate, navigate to: {}", flow.verification_uri);
    println!("Enter the code: {}", flow.user_code);

    let grant = auth
        .wait_for_device_authorization(&flow)
        .await
        .context("complete device-authorization flow")?;
    Ok(grant.access_token)
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}
