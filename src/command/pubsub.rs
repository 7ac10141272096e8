use crate::command::{arg_to_bytes, arg_to_string, wrong_arg_count};
use crate::connection::ClientState;
use crate::pubsub::{SharedPubSub, Sink};
use crate::resp::Value;

/// SUBSCRIBE channel [channel ...]
///
/// Each confirmation goes straight to the caller's sink as it is produced,
/// carrying the 1-based index of the channel within this call; the handler
/// itself returns `Ignore` so the dispatcher writes no final reply.
pub async fn cmd_subscribe(
    args: &[Value],
    client: &ClientState,
    pubsub: &SharedPubSub,
    sink: &Sink,
) -> Value {
    if args.is_empty() {
        return wrong_arg_count("subscribe");
    }

    let mut ps = pubsub.write().await;
    let mut subscribed = 0i64;
    for arg in args {
        let Some(channel) = arg_to_string(arg) else {
            continue;
        };
        ps.subscribe(client.id, &channel, sink.clone());
        subscribed += 1;

        let confirmation = Value::array(vec![
            Value::bulk_string(b"subscribe".to_vec()),
            Value::bulk_string(channel.into_bytes()),
            Value::integer(subscribed),
        ]);
        let _ = sink.send(confirmation);
    }

    Value::Ignore
}

/// PUBLISH channel message
pub async fn cmd_publish(args: &[Value], pubsub: &SharedPubSub) -> Value {
    if args.len() != 2 {
        return wrong_arg_count("publish");
    }
    let channel = match arg_to_string(&args[0]) {
        Some(c) => c,
        None => return Value::error("ERR invalid channel"),
    };
    let message = match arg_to_bytes(&args[1]) {
        Some(m) => m,
        None => return Value::error("ERR invalid message"),
    };

    let ps = pubsub.read().await;
    Value::integer(ps.publish(&channel, message) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pubsub::PubSubRegistry;
    use std::sync::Arc;
    use tokio::sync::{RwLock, mpsc};

    fn bulk_args(parts: &[&str]) -> Vec<Value> {
        parts
            .iter()
            .map(|p| Value::bulk_string(p.as_bytes().to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_subscribe_confirms_each_channel_in_order() {
        let pubsub = Arc::new(RwLock::new(PubSubRegistry::new()));
        let client = ClientState::new();
        let (sink, mut rx) = mpsc::unbounded_channel();

        let reply = cmd_subscribe(&bulk_args(&["a", "b"]), &client, &pubsub, &sink).await;
        assert_eq!(reply, Value::Ignore);

        let first = rx.try_recv().unwrap();
        assert_eq!(
            first,
            Value::array(vec![
                Value::bulk_string(b"subscribe".to_vec()),
                Value::bulk_string(b"a".to_vec()),
                Value::integer(1),
            ])
        );
        let second = rx.try_recv().unwrap();
        assert_eq!(
            second,
            Value::array(vec![
                Value::bulk_string(b"subscribe".to_vec()),
                Value::bulk_string(b"b".to_vec()),
                Value::integer(2),
            ])
        );
    }

    #[tokio::test]
    async fn test_publish_reports_attempted_sinks() {
        let pubsub = Arc::new(RwLock::new(PubSubRegistry::new()));
        let c1 = ClientState::new();
        let c2 = ClientState::new();
        let (sink1, mut rx1) = mpsc::unbounded_channel();
        let (sink2, mut rx2) = mpsc::unbounded_channel();

        cmd_subscribe(&bulk_args(&["c"]), &c1, &pubsub, &sink1).await;
        cmd_subscribe(&bulk_args(&["c"]), &c2, &pubsub, &sink2).await;
        rx1.try_recv().unwrap();
        rx2.try_recv().unwrap();

        let reply = cmd_publish(&bulk_args(&["c", "hi"]), &pubsub).await;
        assert_eq!(reply, Value::integer(2));

        let expected = Value::array(vec![
            Value::bulk_string(b"message".to_vec()),
            Value::bulk_string(b"c".to_vec()),
            Value::bulk_string(b"hi".to_vec()),
        ]);
        assert_eq!(rx1.try_recv().unwrap(), expected);
        assert_eq!(rx2.try_recv().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_publish_empty_channel() {
        let pubsub = Arc::new(RwLock::new(PubSubRegistry::new()));
        let reply = cmd_publish(&bulk_args(&["nobody", "hi"]), &pubsub).await;
        assert_eq!(reply, Value::integer(0));
    }

    #[tokio::test]
    async fn test_publish_arity() {
        let pubsub = Arc::new(RwLock::new(PubSubRegistry::new()));
        assert!(matches!(
            cmd_publish(&bulk_args(&["only-channel"]), &pubsub).await,
            Value::Error(_)
        ));
    }
}
