//! Vitae: personal profile and CV management server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use vitae_core::AppConfig;
use vitae_server::mail::LogMailer;
use vitae_server::sweeper::start_session_sweeper;
use vitae_server::{build_router, AppState};
use vitae_store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" | "help" => {
                println!("Vitae: personal profile and CV management server");
                println!();
                println!("Usage: vitae [command]");
                println!();
                println!("Commands:");
                println!("  (none)    Start the server");
                println!("  help      Show this help message");
                println!();
                println!("Configuration is read from the environment (APP_SETTINGS, PORT,");
                println!("DATABASE_URL, SECRET_KEY, SECURITY_PASSWORD_SALT, BASE_URL, ...).");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'vitae help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let config = AppConfig::from_env()?;
    info!("Starting with {} profile", config.profile);
    let port = config.port;

    let store = SqliteStore::open(&config.database_path)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    if let Some(admin) = &config.admin {
        let password = admin.password.clone();
        let cost = config.bcrypt_cost;
        let hash =
            tokio::task::spawn_blocking(move || vitae_auth::hash_password(&password, cost))
                .await??;
        store.ensure_admin(&admin.email, &hash)?;
    }

    let mailer = Arc::new(LogMailer::new(config.mail.clone()));
    let state = Arc::new(AppState::new(config, store, mailer));

    start_session_sweeper(state.clone());

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Vitae server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
