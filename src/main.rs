//! # SustentaTech CLI
//!
//! Command-line driver for the SustentaTech client core. The session token is
//! kept in a file between invocations, so `login` once and then query
//! resources as that user.
//!
//! ## Environment Setup
//! ```bash
//! API_BASE_URL=http://localhost:3000   # backend, this is the default
//! AUTH_TOKEN_PATH=.sustentatech/authToken
//! RUST_LOG=info
//! ```
//!
//! ## Usage
//! ```bash
//! sustentatech login ana@escola.com secret
//! sustentatech whoami
//! sustentatech get /classroom
//! sustentatech delete /student 42
//! sustentatech notifications
//! sustentatech notifications --watch   # poll every NOTIFICATION_POLL_SECS until logged out
//! sustentatech logout
//! ```

use std::sync::Arc;
use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sustentatech_client::auth::{FileTokenStore, Route, RouteTracker, SessionHandle, SessionManager, SessionPhase};
use sustentatech_client::config::Config;
use sustentatech_client::http::{ApiContext, RequestClient, RequestMethod, Transport};
use sustentatech_client::resources::{NotificationFeed, paths};

enum Command {
    Login { email: String, password: String },
    Logout,
    WhoAmI,
    Get { path: String },
    Delete { path: String, id: String },
    Notifications { watch: bool },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let arg = |i: usize, name: &str| {
            args.get(i).cloned().with_context(|| format!("missing <{}>\n\n{}", name, usage()))
        };

        match args.first().map(String::as_str) {
            Some("login") => Ok(Command::Login { email: arg(1, "email")?, password: arg(2, "password")? }),
            Some("logout") => Ok(Command::Logout),
            Some("whoami") => Ok(Command::WhoAmI),
            Some("get") => Ok(Command::Get { path: arg(1, "path")? }),
            Some("delete") => Ok(Command::Delete { path: arg(1, "path")?, id: arg(2, "id")? }),
            Some("notifications") => match args.get(1).map(String::as_str) {
                None => Ok(Command::Notifications { watch: false }),
                Some("--watch") => Ok(Command::Notifications { watch: true }),
                Some(other) => bail!("unknown notifications flag '{}'\n\n{}", other, usage()),
            },
            Some(other) => bail!("unknown command '{}'\n\n{}", other, usage()),
            None => bail!("{}", usage()),
        }
    }
}

fn usage() -> String {
    format!(
        "usage: sustentatech <login EMAIL PASSWORD | logout | whoami | get PATH | delete PATH ID | notifications [--watch]>\nresources: {}",
        paths::ALL.join(", ")
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = Config::from_env()?;
    tracing::debug!("Backend: {}", config.api_base_url);

    let transport: Arc<dyn Transport> = Arc::new(RequestClient::from_config(&config)?);
    let start = match command {
        Command::Login { .. } => Route::Login,
        _ => Route::Other("/cli".to_string()),
    };
    let routes = Arc::new(RouteTracker::new(start));
    let session = SessionHandle::new(Arc::new(FileTokenStore::new(&config.token_path)), routes);
    let manager = SessionManager::new(transport.clone(), session.clone());
    let context = ApiContext::new(transport, session.clone());

    let phase = manager.restore();

    match command {
        Command::Login { email, password } => {
            let user = manager.login(&email, &password).await?;
            println!("Logged in as {} <{}> ({})", user.full_name(), user.email, user.role.as_str());
        }
        Command::Logout => {
            manager.logout();
            println!("Logged out");
        }
        Command::WhoAmI => match manager.user() {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("Not logged in"),
        },
        Command::Get { path } => {
            require_session(phase)?;
            let resource = context.resource::<serde_json::Value>(path);
            let data = resource.fetch(RequestMethod::Get).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Command::Delete { path, id } => {
            require_session(phase)?;
            let resource = context.resource::<serde_json::Value>(path);
            resource.fetch(RequestMethod::delete(id)).await?;
            println!("Deleted");
        }
        Command::Notifications { watch: false } => {
            require_session(phase)?;
            let feed = NotificationFeed::new(&context);
            for notification in feed.refresh().await? {
                println!("[{}] {} -> {}", notification.id, notification.message, notification.url);
            }
            println!("{} notification(s)", feed.count());
        }
        Command::Notifications { watch: true } => {
            require_session(phase)?;
            let feed = Arc::new(NotificationFeed::new(&context));
            let polling = feed.spawn_polling(config.notifications.poll_interval);
            println!(
                "Watching notifications every {}s, Ctrl+C to stop",
                config.notifications.poll_interval.as_secs()
            );

            tokio::select! {
                result = polling => {
                    result.context("notification polling task failed")?;
                    println!("Session ended, {} notification(s) at last refresh", feed.count());
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("{} notification(s)", feed.count());
                }
            }
        }
    }

    Ok(())
}

fn require_session(phase: SessionPhase) -> Result<()> {
    if phase != SessionPhase::Authenticated {
        bail!("not logged in, run `sustentatech login <email> <password>` first");
    }
    Ok(())
}
