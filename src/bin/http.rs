#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use gantt_csv::{InMemoryTimeline, Session, TimelineConfig, http_api};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let addr: SocketAddr = std::env::var("GANTT_CSV_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let config = match std::env::var("GANTT_CSV_TIMELINE_CONFIG") {
        Ok(path) => {
            tracing::info!(%path, "loading timeline config");
            TimelineConfig::load_json(path)?
        }
        Err(_) => TimelineConfig::default(),
    };

    tracing::info!(%addr, "gantt-csv HTTP API listening");
    let session = Session::with_engine(InMemoryTimeline::new(), config);
    http_api::serve(addr, session).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
