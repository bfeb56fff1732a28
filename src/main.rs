mod cli;

use std::sync::Arc;

use taskdeck::notify::NoticeBuffer;
use taskdeck::{AppContext, ClientConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "taskdeck=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = cli::command().get_matches();

    let config = ClientConfig::new_from_env()?;
    let notices = Arc::new(NoticeBuffer::new());
    let ctx = AppContext::from_config(&config, notices.clone())?;

    let result = cli::dispatch(&ctx, &matches).await;

    for notice in notices.take() {
        println!("{}", notice);
    }
    result?;

    Ok(())
}
