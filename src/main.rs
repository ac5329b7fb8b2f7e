//! partsbin server binary.
//!
//! Run with:
//!   PARTSBIN_LOG_FORMAT=pretty cargo run
//!
//! Try:
//!   curl 'http://localhost:8080/filtered-components?type=CPU&sort=price&page=1'

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use partsbin::{App, ComponentSource, Config, RateLimiter, Server, StaticCatalog, Views, logging, routes};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init(logging::LogFormat::Json);
            error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> partsbin::Result<()> {
    let catalog: Arc<dyn ComponentSource> = match &config.catalog_path {
        Some(path) => {
            info!(path = %path.display(), "loading catalog");
            Arc::new(StaticCatalog::from_json_file(path)?)
        }
        None => Arc::new(StaticCatalog::reference()),
    };
    info!(components = catalog.components().len(), "catalog ready");

    let views = Views::load(&config.templates_dir)?;
    let app = Arc::new(App::new(catalog, views));

    Server::bind(config.addr)
        .rate_limit(RateLimiter::new(config.rate_per_sec, config.burst))
        .grace_period(config.grace_period)
        .serve(routes::router(app))
        .await
}
