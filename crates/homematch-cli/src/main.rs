//! homematch - command-line client for the homematch matching service.
//!
//! Thin composition root over `homematch-core`: builds the config,
//! transport, session store, and gateway, bootstraps the session, then
//! dispatches one command.

use std::io;
use std::sync::Arc;

use anyhow::Result;
use homematch_core::api::{ApiError, ApiGateway, HttpClient};
use homematch_core::auth::{Role, RoleStore, SessionStore};
use homematch_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() -> ! {
    eprintln!("Usage: homematch <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  login <tenant|landlord>   print the Google login URL for a role");
    eprintln!("  status                    show the current session state");
    eprintln!("  refresh                   force an access-token refresh");
    eprintln!("  requests                  list your tenant requests");
    eprintln!("  recommendations           list recommended listings");
    eprintln!("  chat <message...>         ask the listing assistant");
    eprintln!("  logout                    end the session");
    std::process::exit(2);
}

/// Translate the gateway's terminal auth failure into a login hint.
fn require_session<T>(result: Result<T, ApiError>) -> Result<T> {
    match result {
        Err(ApiError::Unauthenticated) => anyhow::bail!(
            "session expired - run `homematch login <tenant|landlord>` to sign in again"
        ),
        other => Ok(other?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else { usage() };

    let config = Config::from_env()?;
    let transport = Arc::new(HttpClient::new(&config)?);
    let store = Arc::new(SessionStore::new(
        transport.clone(),
        RoleStore::new(config.state_dir.clone()),
    ));
    let gateway = ApiGateway::new(store.clone(), transport);

    store.init().await;

    match command.as_str() {
        "login" => {
            let Some(role) = args.get(2).and_then(|raw| raw.parse::<Role>().ok()) else {
                usage()
            };
            let url = store.begin_google_login(role);
            println!("Open this URL in a browser to sign in as a {role}:");
            println!("{url}");
            println!("Once the flow completes, run `homematch status`.");
        }
        "status" => {
            let state = store.state();
            match state.role {
                Some(role) => println!("role: {role}"),
                None => println!("role: (none)"),
            }
            println!("authenticated: {}", state.is_authenticated);
        }
        "refresh" => match store.refresh_access_token().await {
            Some(_) => println!("access token renewed"),
            None => println!("session could not be renewed - log in again"),
        },
        "requests" => {
            let requests = require_session(gateway.tenant_requests().await)?;
            if requests.is_empty() {
                println!("no tenant requests yet");
            }
            for request in requests {
                println!(
                    "#{} {} {}/{} budget {}",
                    request.id,
                    request.preferred_area,
                    request.residence_type,
                    request.deal_type,
                    request.budget
                );
            }
        }
        "recommendations" => {
            let listings = require_session(gateway.recommended_listings(None).await)?;
            if listings.is_empty() {
                println!("no recommendations right now");
            }
            for listing in listings {
                println!(
                    "[{}] {} - {} {} ({} m2, {} rooms) {} {}",
                    listing.id,
                    listing.title,
                    listing.region,
                    listing.district,
                    listing.area,
                    listing.rooms,
                    listing.contract_type,
                    listing.price
                );
            }
        }
        "chat" => {
            let message = args[2..].join(" ");
            if message.trim().is_empty() {
                usage()
            }
            let reply = require_session(gateway.send_chat_message(&message).await)?;
            println!("{reply}");
        }
        "logout" => {
            store.logout().await;
            println!("logged out");
        }
        _ => usage(),
    }

    Ok(())
}
