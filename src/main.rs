use comfy_pose_batch::config::AppConfig;
use comfy_pose_batch::run;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[cfg(debug_assertions)]
use dotenv::dotenv;

#[tokio::main]
async fn main() {
    #[cfg(debug_assertions)]
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    debug!("config: {:?}", config);

    if let Err(e) = run(config).await {
        error!("batch aborted: {}", e);
        std::process::exit(1);
    }
}
