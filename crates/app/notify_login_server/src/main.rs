//! Notify login gateway server binary.
//!
//! Serves `GET /login`, exchanging a known username for a notify access token
//! cookie. All settings come from CLI flags or the environment (a `.env` file
//! is honoured).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use notify_login_api::config::{ApiConfig, DEFAULT_ALLOWED_ORIGIN};
use notify_login_core::identity::StaticDirectory;
use notify_login_core::login::{
    DEFAULT_PROVISIONED_USERNAME, DEFAULT_TOKEN_ORIGIN, LoginOrchestrator, LoginSettings,
};
use notify_login_core::notify::config::DEFAULT_LOOKUP_ATTEMPTS;
use notify_login_core::notify::{HttpNotifyClient, NotifyConfig};
use tracing::{info, warn};

/// CLI arguments for the gateway.
#[derive(Parser, Debug)]
#[command(name = "notify_login_server", about = "Notify login gateway")]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on (0 = ephemeral).
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Base URL of the notify service.
    #[arg(long, env = "NOTIFY_BASE_URL", default_value = "http://localhost:8080")]
    notify_url: String,

    /// Shared secret sent to the notify service in `x-notify-token`.
    #[arg(long, env = "NOTIFY_SERVICE_TOKEN", hide_env_values = true)]
    notify_token: String,

    /// `origin` recorded on issued tokens.
    #[arg(long, env = "NOTIFY_TOKEN_ORIGIN", default_value = DEFAULT_TOKEN_ORIGIN)]
    token_origin: String,

    /// Browser origin allowed to call `/login` with credentials.
    #[arg(long, env = "ALLOWED_ORIGIN", default_value = DEFAULT_ALLOWED_ORIGIN)]
    allowed_origin: String,

    /// YAML file mapping usernames to internal ids. Uses the built-in table if unset.
    #[arg(long, env = "USERS_FILE")]
    users_file: Option<PathBuf>,

    /// Username given to provisioned notify accounts.
    #[arg(long, env = "NOTIFY_PROVISIONED_USERNAME", default_value = DEFAULT_PROVISIONED_USERNAME)]
    provisioned_username: String,

    /// Timeout for each notify service request, in seconds.
    #[arg(long, env = "NOTIFY_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Attempts for the notify user lookup (transient failures only).
    #[arg(long, env = "NOTIFY_LOOKUP_ATTEMPTS", default_value_t = DEFAULT_LOOKUP_ATTEMPTS)]
    lookup_attempts: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,notify_login_api=debug,notify_login_core=debug",
                )
            }),
        )
        .init();

    let args = Args::parse();

    info!(
        version = notify_login_core::version(),
        notify_url = %args.notify_url,
        port = args.port,
        "starting notify_login_server"
    );

    let directory = match &args.users_file {
        Some(path) => {
            info!(path = %path.display(), "loading user directory");
            StaticDirectory::from_file(path)?
        }
        None => StaticDirectory::builtin(),
    };
    if directory.is_empty() {
        warn!("user directory is empty, every login will be rejected");
    }
    info!(users = directory.len(), "user directory ready");

    let notify_config = NotifyConfig::new(&args.notify_url, args.notify_token)?
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_lookup_attempts(args.lookup_attempts);
    let notify = HttpNotifyClient::new(notify_config)?;

    let login = LoginOrchestrator::new(
        Arc::new(directory),
        Arc::new(notify),
        LoginSettings {
            origin: args.token_origin,
            provisioned_username: args.provisioned_username,
        },
    );

    let config = ApiConfig::new(format!("{}:{}", args.host, args.port), &args.allowed_origin)?;
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let state = notify_login_api::AppState {
        login: Arc::new(login),
        config,
    };
    let app = notify_login_api::router(state);

    info!(addr = %local_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
