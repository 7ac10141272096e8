//! # Cinder
//!
//! An in-memory key-value store speaking the Redis RESP2 wire protocol,
//! with crash durability via an append-only command log and simple
//! publish/subscribe messaging.
//!
//! One tokio task serves each connection; the store sits behind a single
//! exclusive lock, the pub/sub registry behind a read/write lock, and the
//! log behind a mutex shared with a once-a-second fsync task. The log is
//! replayed through the regular command table at startup, before any
//! connection is accepted.

pub mod aof;
pub mod command;
pub mod config;
pub mod connection;
pub mod pubsub;
pub mod resp;
pub mod server;
pub mod store;
