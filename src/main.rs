use dotenvy::dotenv;
use foodgram::{
    api::{self, AppState},
    config::{
        AppConfig,
        database::{create_connection, create_tables},
        seed::{apply_seed, load_seed},
    },
    errors::Result,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = AppConfig::from_env()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed tags and ingredients when a seed file is configured
    if let Some(path) = &app_config.seed_file {
        let seed = load_seed(path)?;
        let (ingredients, tags) = apply_seed(&db, &seed)
            .await
            .inspect_err(|e| error!("Failed to seed reference data: {}", e))?;
        info!("Seeded {ingredients} ingredients and {tags} tags from {}", path.display());
    }

    // 6. Serve the API
    api::serve(AppState {
        database: db,
        config: Arc::new(app_config),
    })
    .await
}
