use crate::command::{arg_to_bytes, arg_to_i64, arg_to_string, wrong_arg_count};
use crate::resp::Value;
use crate::store::SharedStore;
use crate::store::entry::now_millis;

pub async fn cmd_get(args: &[Value], store: &SharedStore) -> Value {
    if args.len() != 1 {
        return wrong_arg_count("get");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return Value::Null,
    };

    let mut store = store.lock().await;
    match store.get(&key) {
        Some(entry) => Value::bulk_string(entry.value.clone()),
        None => Value::Null,
    }
}

/// SET key value [EX seconds | PX milliseconds]
///
/// Options are scanned left to right in a single pass; the last expiry
/// option wins, and tokens outside the grammar are skipped.
pub async fn cmd_set(args: &[Value], store: &SharedStore) -> Value {
    if args.len() < 2 {
        return wrong_arg_count("set");
    }
    let key = match arg_to_string(&args[0]) {
        Some(k) => k,
        None => return Value::error("ERR invalid key"),
    };
    let value = match arg_to_bytes(&args[1]) {
        Some(v) => v.to_vec(),
        None => return Value::error("ERR invalid value"),
    };

    let mut expires_at: Option<u64> = None;
    let mut i = 2;
    while i < args.len() {
        let opt = arg_to_string(&args[i])
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        match opt.as_str() {
            "EX" => {
                i += 1;
                let Some(arg) = args.get(i) else {
                    return Value::error("ERR syntax error");
                };
                let Some(seconds) = arg_to_i64(arg) else {
                    return Value::error("ERR value is not an integer or out of range");
                };
                expires_at = Some(expiry_from_now(seconds.saturating_mul(1000)));
            }
            "PX" => {
                i += 1;
                let Some(arg) = args.get(i) else {
                    return Value::error("ERR syntax error");
                };
                let Some(millis) = arg_to_i64(arg) else {
                    return Value::error("ERR value is not an integer or out of range");
                };
                expires_at = Some(expiry_from_now(millis));
            }
            _ => {}
        }
        i += 1;
    }

    store.lock().await.set(key, value, expires_at);
    Value::ok()
}

/// Absolute expiry `delta_ms` from now. A negative duration clamps to the
/// epoch, i.e. an already-expired key.
fn expiry_from_now(delta_ms: i64) -> u64 {
    (now_millis() as i64).saturating_add(delta_ms).max(0) as u64
}
