use std::io;

use record_poster::config::DEFAULT_LOG_FILTER;
use record_poster::{RecordPoster, RestError};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), RestError> {
    init_tracing();

    let poster = RecordPoster::new()?;
    tracing::info!("posting sample record to {}", poster.endpoint());

    let stdout = io::stdout();
    poster.run(&mut stdout.lock()).await?;
    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
