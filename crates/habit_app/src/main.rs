use habit_app::app::{run, AppConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err:#}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(config).await {
        eprintln!("Failed to start habit webhook: {err:#}");
        std::process::exit(1);
    }
}
