use log::{error, info};
use std::env;

use recipe_suggest::{advisor, web, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;

    // Build the shared advisor before binding so a missing token stops startup
    let advisor = match advisor::init_shared(&config) {
        Ok(advisor) => advisor,
        Err(e) => {
            error!("Cannot start: {}", e);
            return Err(e.into());
        }
    };

    // An optional address argument overrides the configured one
    let address = env::args()
        .nth(1)
        .unwrap_or_else(|| config.server.address());

    info!(
        "Recipe suggestions by {} ({})",
        advisor.provider_name(),
        advisor.model()
    );
    web::serve(advisor, &address).await?;

    Ok(())
}
