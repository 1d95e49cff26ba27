//! Returns backend smoke checker
//!
//! Single-binary tool that exercises the authenticated client end to end:
//! 1. `login <username>` obtains and persists a credential pair
//! 2. `me` fetches the identity behind the stored credential
//! 3. `get <path>` issues an arbitrary decorated GET
//!
//! Expired credentials renew and replay invisibly, so a passing `get` proves
//! the whole path. If the session ends (renewal failed, store cleared) the
//! tool reports it and exits non-zero so a cron-driven check flags it.

mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use returns_auth::TokenStore;
use returns_client::{ApiClient, SessionEvent};

use crate::config::Config;

const USAGE: &str = "usage: returns-check [--config <path>] <login <username> | me | get <path>>";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // CLI: simple --config flag plus one subcommand
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let cli_config_path = match args.iter().position(|a| a == "--config") {
        Some(i) => {
            if i + 1 >= args.len() {
                bail!("--config requires a path\n{USAGE}");
            }
            args.remove(i);
            Some(args.remove(i))
        }
        None => None,
    };

    let config_path = Config::resolve_path(cli_config_path.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    info!(
        base_url = %config.api.base_url,
        credentials_file = %config.api.credentials_file.display(),
        "configuration loaded"
    );

    let store = Arc::new(TokenStore::load(config.api.credentials_file.clone()).await);
    let client = ApiClient::with_timeout(
        config.api.base_url.clone(),
        store,
        Duration::from_secs(config.api.timeout_secs),
    );
    let mut session_ended = client.subscribe_session();

    let outcome = match args.first().map(String::as_str) {
        Some("login") => {
            let username = args
                .get(1)
                .with_context(|| format!("login needs a username\n{USAGE}"))?;
            let password = std::env::var("RETURNS_PASSWORD")
                .context("set RETURNS_PASSWORD to the account password")?;
            login(&client, username, &password).await
        }
        Some("me") => me(&client).await,
        Some("get") => {
            let path = args
                .get(1)
                .with_context(|| format!("get needs a path\n{USAGE}"))?;
            get(&client, path).await
        }
        _ => bail!("{USAGE}"),
    };

    // A terminal renewal failure is the headline result, whatever the
    // command itself returned
    if let Ok(SessionEvent::Ended) = session_ended.try_recv() {
        eprintln!("session ended: reauthentication required");
        std::process::exit(2);
    }

    outcome
}

async fn login(client: &ApiClient, username: &str, password: &str) -> Result<()> {
    let session = client
        .login(username, password)
        .await
        .context("login failed")?;
    println!("logged in as {}", session.username);
    Ok(())
}

async fn me(client: &ApiClient) -> Result<()> {
    let user = client
        .current_user()
        .await
        .context("current-user check failed")?;
    println!("authenticated as {}", user.username);
    Ok(())
}

async fn get(client: &ApiClient, path: &str) -> Result<()> {
    let response = client.get(path).await.context("request failed")?;
    let status = response.status();
    match response.json::<serde_json::Value>() {
        Ok(body) => println!("{status}\n{}", serde_json::to_string_pretty(&body)?),
        Err(_) => println!("{status}\n{}", response.text()),
    }
    if !status.is_success() {
        bail!("backend returned {status} for {path}");
    }
    Ok(())
}
