use crate::aof::SharedAofWriter;
use crate::command;
use crate::config::SharedConfig;
use crate::connection::ClientState;
use crate::pubsub::{SharedPubSub, Sink, SinkReceiver};
use crate::resp::{Parser, Value};
use crate::store::SharedStore;
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Entries examined per sweeper tick.
const SWEEP_SAMPLE: usize = 20;

pub async fn run_server(
    store: SharedStore,
    config: SharedConfig,
    pubsub: SharedPubSub,
    aof: SharedAofWriter,
) -> std::io::Result<()> {
    let (bind, port, sweep_interval) = {
        let cfg = config.read().await;
        (cfg.bind.clone(), cfg.port, cfg.sweep_interval())
    };

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("cinder listening on {addr}");

    // Spawn active expiration background task
    let store_clone = store.clone();
    tokio::spawn(async move {
        sweeper_loop(store_clone, sweep_interval).await;
    });

    // Spawn AOF fsync background task
    let aof_clone = aof.clone();
    tokio::spawn(async move {
        aof_sync_loop(aof_clone).await;
    });

    // Accept loop with graceful shutdown on ctrl-c
    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = result?;
                debug!("new connection from {peer_addr}");

                let store = store.clone();
                let pubsub = pubsub.clone();
                let aof = aof.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, store, pubsub, aof).await {
                        debug!("connection error from {peer_addr}: {e}");
                    }
                    debug!("connection closed: {peer_addr}");
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down...");
                // The lock waits out any in-flight append or sync, then the
                // log is synced and released.
                let mut aof = aof.lock().await;
                aof.close();
                return Ok(());
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    store: SharedStore,
    pubsub: SharedPubSub,
    aof: SharedAofWriter,
) -> std::io::Result<()> {
    let client = ClientState::new();
    let mut buf = BytesMut::with_capacity(4096);

    // This task is the only writer to the socket: direct replies here,
    // pub/sub deliveries and subscribe confirmations through this channel.
    let (sink, mut messages): (Sink, SinkReceiver) = mpsc::unbounded_channel();

    loop {
        // Process any complete requests already buffered
        loop {
            match Parser::parse(&mut buf) {
                Ok(Some(request)) => {
                    let response =
                        process_command(request, &store, &pubsub, &client, &sink, &aof).await;

                    match response {
                        Value::Ignore => {}
                        value => stream.write_all(&value.serialize()).await?,
                    }

                    // Flush whatever this request pushed at the sink (its
                    // subscribe confirmations) before the next request's
                    // reply, preserving per-connection order.
                    while let Ok(msg) = messages.try_recv() {
                        stream.write_all(&msg.serialize()).await?;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // Framing is lost; drop the connection without a reply.
                    debug!("protocol error, closing connection: {e}");
                    cleanup_client(&pubsub, &client).await;
                    return Ok(());
                }
            }
        }

        // Wait for more request bytes or a published message
        tokio::select! {
            result = stream.read_buf(&mut buf) => {
                match result {
                    Ok(0) => {
                        if !buf.is_empty() {
                            debug!("peer closed mid-frame");
                        }
                        cleanup_client(&pubsub, &client).await;
                        return Ok(());
                    }
                    Ok(_) => {} // Got data, loop back to parse
                    Err(e) => {
                        cleanup_client(&pubsub, &client).await;
                        return Err(e);
                    }
                }
            }
            Some(msg) = messages.recv() => {
                stream.write_all(&msg.serialize()).await?;
            }
        }
    }
}

/// Commands whose effect mutates store state; exactly these are logged.
fn is_write_command(cmd: &str) -> bool {
    matches!(cmd, "SET" | "DEL")
}

async fn process_command(
    request: Value,
    store: &SharedStore,
    pubsub: &SharedPubSub,
    client: &ClientState,
    sink: &Sink,
    aof: &SharedAofWriter,
) -> Value {
    let items = match &request {
        Value::Array(items) if !items.is_empty() => items,
        // Not a command frame; skip it without a reply.
        _ => return Value::Ignore,
    };

    let cmd_name = match items[0].to_string_lossy() {
        Some(name) => name.to_uppercase(),
        None => return Value::error("ERR invalid command name"),
    };

    // Write commands hit the log as the original request value, before the
    // handler runs. A failed append refuses the command: the store must not
    // hold a mutation the log does not.
    if is_write_command(&cmd_name) {
        let mut aof = aof.lock().await;
        if let Err(e) = aof.append(&request) {
            error!("append only file write failed: {e}");
            return Value::error("ERR append only file write failed");
        }
    }

    command::dispatch(&cmd_name, &items[1..], store, pubsub, client, sink).await
}

/// Apply one replayed log record through the normal command table. The
/// caller supplies a sink nothing listens on, so nothing is written back,
/// and this path never appends.
pub async fn apply_replayed(
    request: Value,
    store: &SharedStore,
    pubsub: &SharedPubSub,
    sink: &Sink,
) {
    let Value::Array(items) = request else {
        return;
    };
    if items.is_empty() {
        return;
    }
    let Some(name) = items[0].to_string_lossy() else {
        return;
    };
    let name = name.to_uppercase();

    if !command::is_known(&name) {
        warn!("skipping unknown command '{name}' in append only file");
        return;
    }

    let client = ClientState::new();
    let _ = command::dispatch(&name, &items[1..], store, pubsub, &client, sink).await;
}

async fn cleanup_client(pubsub: &SharedPubSub, client: &ClientState) {
    let mut ps = pubsub.write().await;
    ps.unsubscribe_all(client.id);
}

/// Background task that periodically evicts a sample of expired keys.
/// Purely an optimization — lazy eviction on access stays authoritative.
async fn sweeper_loop(store: SharedStore, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        let removed = store.lock().await.evict_expired_sample(SWEEP_SAMPLE);
        if removed > 0 {
            debug!("sweeper evicted {removed} expired keys");
        }
    }
}

/// Background task that flushes the AOF to stable storage every second.
async fn aof_sync_loop(aof: SharedAofWriter) {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let mut aof = aof.lock().await;
        if let Err(e) = aof.sync() {
            error!("append only file sync failed: {e}");
        }
    }
}
