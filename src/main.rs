use demdesk::config::Config;
use demdesk::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = Config::from_env();
    log::info!(
        "Starting demdesk (data dir: {}, model: {})",
        config.data_dir.display(),
        config.openai_model
    );
    if config.openai_api_key.is_none() {
        log::warn!("OPENAI_API_KEY is not set; AI features run in degraded mode");
    }
    if config.app_user.is_none() || config.app_pass.is_none() {
        log::warn!("APP_USER/APP_PASS are not set; login is disabled and the API is locked");
    }

    server::start_server(config).await
}
