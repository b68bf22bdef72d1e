use notes_auth::config::AuthConfig;
use notes_auth::services::{MongoUserRepository, UserRepository};
use notes_auth::startup::Application;
use service_core::observability::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AuthConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(&config.service_name, &config.common.log_level);

    let repo = MongoUserRepository::connect(&config.mongodb.uri, &config.mongodb.database).await?;
    repo.initialize_indexes().await?;
    let users: Arc<dyn UserRepository> = Arc::new(repo);

    let app = Application::build(config, users)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start: {}", e))?;

    app.run_until_stopped().await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
