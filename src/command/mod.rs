pub mod key;
pub mod pubsub;
pub mod server_cmd;
pub mod string;

use crate::connection::ClientState;
use crate::pubsub::{SharedPubSub, Sink};
use crate::resp::Value;
use crate::store::SharedStore;

/// Dispatch a parsed command to the appropriate handler.
///
/// `sink` is the caller's own output channel; only SUBSCRIBE uses it (to
/// write its confirmations directly). During log replay the sink's
/// receiver is closed, which turns those writes into no-ops.
pub async fn dispatch(
    cmd_name: &str,
    args: &[Value],
    store: &SharedStore,
    pubsub: &SharedPubSub,
    client: &ClientState,
    sink: &Sink,
) -> Value {
    match cmd_name {
        // Connection
        "PING" => server_cmd::cmd_ping(args),
        "ECHO" => server_cmd::cmd_echo(args),

        // Strings
        "GET" => string::cmd_get(args, store).await,
        "SET" => string::cmd_set(args, store).await,

        // Keys
        "DEL" => key::cmd_del(args, store).await,
        "EXISTS" => key::cmd_exists(args, store).await,
        "TTL" => key::cmd_ttl(args, store).await,

        // Pub/Sub
        "SUBSCRIBE" => pubsub::cmd_subscribe(args, client, pubsub, sink).await,
        "PUBLISH" => pubsub::cmd_publish(args, pubsub).await,

        // Introspection stubs
        "COMMAND" => server_cmd::cmd_command(),
        "CLIENT" => server_cmd::cmd_client(),
        "INFO" => server_cmd::cmd_info(),
        "SELECT" => server_cmd::cmd_select(),

        _ => Value::error(format!("ERR unknown command '{cmd_name}'")),
    }
}

/// Check if a command name is known (used to flag junk during log replay).
pub fn is_known(cmd: &str) -> bool {
    matches!(
        cmd,
        "PING"
            | "ECHO"
            | "GET"
            | "SET"
            | "DEL"
            | "EXISTS"
            | "TTL"
            | "SUBSCRIBE"
            | "PUBLISH"
            | "COMMAND"
            | "CLIENT"
            | "INFO"
            | "SELECT"
    )
}

/// Extract string bytes from a value argument.
pub fn arg_to_bytes(arg: &Value) -> Option<&[u8]> {
    arg.as_str()
}

/// Extract a UTF-8 string from a value argument.
pub fn arg_to_string(arg: &Value) -> Option<String> {
    arg.to_string_lossy()
}

/// Extract an i64 from a value argument.
pub fn arg_to_i64(arg: &Value) -> Option<i64> {
    let s = arg.to_string_lossy()?;
    s.parse().ok()
}

/// Return a wrong number of arguments error.
pub fn wrong_arg_count(cmd: &str) -> Value {
    Value::error(format!("ERR wrong number of arguments for '{cmd}' command"))
}
