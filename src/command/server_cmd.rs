use crate::command::wrong_arg_count;
use crate::resp::Value;

pub fn cmd_ping(args: &[Value]) -> Value {
    match args.first().and_then(|a| a.to_string_lossy()) {
        Some(msg) => Value::SimpleString(msg),
        None => Value::simple_string("PONG"),
    }
}

pub fn cmd_echo(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_arg_count("echo");
    }
    match args[0].as_str() {
        Some(msg) => Value::bulk_string(msg.to_vec()),
        None => Value::Null,
    }
}

pub fn cmd_command() -> Value {
    Value::Array(vec![])
}

pub fn cmd_client() -> Value {
    Value::ok()
}

pub fn cmd_info() -> Value {
    Value::bulk_string(b"role:master".to_vec())
}

/// Single-keyspace server: selecting a database is accepted and ignored.
pub fn cmd_select() -> Value {
    Value::ok()
}
