//! Service entry point

use citizen_registry::{
    auth::{jwt::TokenService, password::PasswordHasher},
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    routes,
    services::{AuthService, UserService},
    telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("citizen-registry {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // .env files are a development convenience; production sets real
    // environment variables
    if let Ok(profile) = std::env::var("REGISTRY_ENV") {
        dotenv::from_filename(format!(".env.{}", profile)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. Configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. Telemetry
    telemetry::init_telemetry(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Citizen registry starting...");

    // 3. Database pool + migrations
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // 4. Application state
    let app_state = Arc::new(build_state(config.clone(), db_pool)?);

    // 5. Router
    let app = routes::create_router(app_state);

    // 6. Serve with graceful shutdown
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wire the services into the shared state
fn build_state(config: AppConfig, db_pool: sqlx::PgPool) -> anyhow::Result<AppState> {
    let token_service = Arc::new(TokenService::from_config(&config)?);
    let hasher = Arc::new(PasswordHasher::from_config(&config)?);

    Ok(AppState {
        auth_service: Arc::new(AuthService::new(
            db_pool.clone(),
            token_service.clone(),
            hasher.clone(),
        )),
        user_service: Arc::new(UserService::new(db_pool.clone(), hasher)),
        token_service,
        db: db_pool,
        config,
    })
}

/// Graceful shutdown on Ctrl+C or SIGTERM
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(timeout_secs, "Shutdown signal received, draining connections");
}

fn print_help() {
    println!("citizen-registry - user directory and authentication service");
    println!();
    println!("USAGE:");
    println!("    citizen-registry [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --version    Print version information");
    println!("    --help       Print this help message");
    println!();
    println!("Configuration comes from REGISTRY_-prefixed environment variables,");
    println!("e.g. REGISTRY_DATABASE__URL, REGISTRY_SECURITY__JWT_SECRET.");
}
