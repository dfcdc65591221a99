use migration::{ Migrator, MigratorTrait };
use reward_settlement::{ api, AppError, Config, Result };
use tower_http::{ cors::CorsLayer, trace::TraceLayer };
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "reward_settlement=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| AppError::Config(e.to_string()))?;

    tracing::info!(
        "Starting reward-settlement (default task reward {}, referral reward {}, minimum withdrawal {})",
        reward_settlement::money::from_cents(config.defaults.task_reward_cents),
        reward_settlement::money::from_cents(config.defaults.referral_reward_cents),
        reward_settlement::money::from_cents(config.defaults.min_withdrawal_cents)
    );

    // Initialize database connection
    let db = sea_orm::Database::connect(&config.database_url).await?;

    tracing::info!("Database connected successfully");

    // Run migrations
    Migrator::up(&db, None).await?;

    tracing::info!("Migrations completed successfully");

    let app_state = api::AppState::new(db, config.defaults);

    if let Some(admin) = &config.admin {
        app_state.user_service.ensure_admin(admin).await?;
    }

    // Build application router
    let app = api
        ::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = config.server_addr();
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    axum::serve(listener, app).await.map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
