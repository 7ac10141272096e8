use crate::command::{arg_to_string, wrong_arg_count};
use crate::resp::Value;
use crate::store::SharedStore;

pub async fn cmd_del(args: &[Value], store: &SharedStore) -> Value {
    if args.is_empty() {
        return wrong_arg_count("del");
    }

    let mut store = store.lock().await;
    let mut count = 0i64;
    for arg in args {
        if let Some(key) = arg_to_string(arg) {
            if store.del(&key) {
                count += 1;
            }
        }
    }

    Value::integer(count)
}

pub async fn cmd_exists(args: &[Value], store: &SharedStore) -> Value {
    if args.is_empty() {
        return wrong_arg_count("exists");
    }

    let mut store = store.lock().await;
    let mut count = 0i64;
    for arg in args {
        if let Some(key) = arg_to_string(arg) {
            if store.exists(&key) {
                count += 1;
            }
        }
    }

    Value::integer(count)
}

pub async fn cmd_ttl(args: &[Value], store: &SharedStore) -> Value {
    if args.len() != 1 {
        return wrong_arg_count("ttl");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return Value::integer(-2),
    };

    Value::integer(store.lock().await.ttl_seconds(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use crate::store::entry::now_millis;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn bulk_args(parts: &[&str]) -> Vec<Value> {
        parts
            .iter()
            .map(|p| Value::bulk_string(p.as_bytes().to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_del_is_idempotent() {
        let store = Arc::new(Mutex::new(Store::new()));
        store
            .lock()
            .await
            .set("k".to_string(), b"v".to_vec(), None);

        assert_eq!(
            cmd_del(&bulk_args(&["k"]), &store).await,
            Value::integer(1)
        );
        assert_eq!(
            cmd_del(&bulk_args(&["k"]), &store).await,
            Value::integer(0)
        );
    }

    #[tokio::test]
    async fn test_del_counts_multiple_keys() {
        let store = Arc::new(Mutex::new(Store::new()));
        {
            let mut s = store.lock().await;
            s.set("a".to_string(), b"1".to_vec(), None);
            s.set("b".to_string(), b"2".to_vec(), None);
        }
        assert_eq!(
            cmd_del(&bulk_args(&["a", "b", "c"]), &store).await,
            Value::integer(2)
        );
    }

    #[tokio::test]
    async fn test_exists_skips_expired() {
        let store = Arc::new(Mutex::new(Store::new()));
        {
            let mut s = store.lock().await;
            s.set("live".to_string(), b"v".to_vec(), None);
            s.set("dead".to_string(), b"v".to_vec(), Some(now_millis() - 1));
        }
        assert_eq!(
            cmd_exists(&bulk_args(&["live", "dead"]), &store).await,
            Value::integer(1)
        );
    }

    #[tokio::test]
    async fn test_ttl_sentinels() {
        let store = Arc::new(Mutex::new(Store::new()));
        {
            let mut s = store.lock().await;
            s.set("forever".to_string(), b"v".to_vec(), None);
            s.set(
                "soon".to_string(),
                b"v".to_vec(),
                Some(now_millis() + 10_000),
            );
        }

        assert_eq!(
            cmd_ttl(&bulk_args(&["missing"]), &store).await,
            Value::integer(-2)
        );
        assert_eq!(
            cmd_ttl(&bulk_args(&["forever"]), &store).await,
            Value::integer(-1)
        );
        let Value::Integer(ttl) = cmd_ttl(&bulk_args(&["soon"]), &store).await else {
            panic!("expected integer reply");
        };
        assert!((0..=10).contains(&ttl), "ttl was {ttl}");
    }
}
