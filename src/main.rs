use cinder::aof::{self, AofWriter};
use cinder::config::Config;
use cinder::pubsub::PubSubRegistry;
use cinder::server;
use cinder::store::Store;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Parse command line args
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_args(&args);

    let store = Arc::new(Mutex::new(Store::new()));
    let pubsub = Arc::new(RwLock::new(PubSubRegistry::new()));

    // Replay the log through the command table before accepting traffic.
    // The sink's receiver is dropped up front: replay writes nothing back.
    let (null_sink, _) = mpsc::unbounded_channel();
    let replayed = {
        let store = store.clone();
        let pubsub = pubsub.clone();
        aof::replay(&config.aof_path, move |request| {
            let store = store.clone();
            let pubsub = pubsub.clone();
            let sink = null_sink.clone();
            async move { server::apply_replayed(request, &store, &pubsub, &sink).await }
        })
        .await
    }
    .map_err(|e| {
        error!("append only file replay failed: {e}");
        std::io::Error::other(e)
    })?;
    if replayed > 0 {
        info!("replayed {replayed} commands from {}", config.aof_path);
    }

    let aof_writer = AofWriter::open(&config.aof_path)?;
    info!("append only file: {}", config.aof_path);
    let aof = Arc::new(Mutex::new(aof_writer));

    let config = Arc::new(RwLock::new(config));
    server::run_server(store, config, pubsub, aof).await
}
