use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use tracing::info;

/// Connects and brings the schema up to date.
pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}
