#![deny(warnings)]

use persistence::default_sqlite_url;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let url = std::env::args().nth(1).unwrap_or_else(|| default_sqlite_url().to_string());
    let pool = persistence::init_db(&url).await?;
    let id = persistence::create_save(&pool, "default", Some("initialized")).await?;
    println!("DB migrated at {url} (save slot {id})");
    Ok(())
}
