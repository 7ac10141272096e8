use bytes::{Buf, BytesMut};

/// A RESP2 value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// +OK\r\n
    SimpleString(String),
    /// -ERR message\r\n
    Error(String),
    /// :1000\r\n
    Integer(i64),
    /// $6\r\nfoobar\r\n
    BulkString(Vec<u8>),
    /// $-1\r\n
    Null,
    /// *2\r\n...
    Array(Vec<Value>),
    /// Handler-internal sentinel: "no reply will be written for this
    /// request". Never encoded.
    Ignore,
}

impl Value {
    pub fn ok() -> Self {
        Value::SimpleString("OK".to_string())
    }

    pub fn simple_string(s: impl Into<String>) -> Self {
        Value::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        Value::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        Value::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Vec<u8>>) -> Self {
        Value::BulkString(data.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(items)
    }

    /// Serialize this value to RESP bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    /// Write RESP bytes into the given buffer, recursing into array
    /// elements in order. A value always becomes one contiguous run of
    /// bytes, so a single `write_all` of the result can never interleave
    /// with another writer's frame.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            Value::SimpleString(s) => {
                buf.push(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            Value::Error(s) => {
                buf.push(b'-');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            Value::Integer(n) => {
                buf.push(b':');
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            Value::BulkString(data) => {
                buf.push(b'$');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            Value::Null => {
                buf.extend_from_slice(b"$-1\r\n");
            }
            Value::Array(items) => {
                buf.push(b'*');
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                for item in items {
                    item.write_to(buf);
                }
            }
            Value::Ignore => {
                debug_assert!(false, "Ignore has no wire encoding");
            }
        }
    }

    /// Try to interpret this value as a string (for command parsing).
    pub fn as_str(&self) -> Option<&[u8]> {
        match self {
            Value::BulkString(data) => Some(data),
            Value::SimpleString(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Convert to a UTF-8 string, if possible.
    pub fn to_string_lossy(&self) -> Option<String> {
        self.as_str()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("invalid integer field: {0}")]
    InvalidInteger(String),

    #[error("stream ended mid-frame")]
    Truncated,
}

/// Streaming RESP parser.
///
/// Handles partial reads — call `parse()` repeatedly as data arrives.
/// Returns `Ok(Some(value))` when a complete value was consumed,
/// `Ok(None)` when more data is needed (the buffer is left untouched).
/// Errors are fatal to the stream: the framing is lost and the caller
/// must drop the connection.
pub struct Parser;

impl Parser {
    /// Try to parse one complete value from the front of the buffer.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<Value>, FrameError> {
        if buf.is_empty() {
            return Ok(None);
        }

        match buf[0] {
            b'+' => Self::parse_simple_string(buf),
            b'-' => Self::parse_error(buf),
            b':' => Self::parse_integer(buf),
            b'$' => Self::parse_bulk_string(buf),
            b'*' => Self::parse_array(buf),
            other => Err(FrameError::MalformedFrame(format!(
                "unrecognized type prefix byte {:#04x}",
                other
            ))),
        }
    }

    fn parse_simple_string(buf: &mut BytesMut) -> Result<Option<Value>, FrameError> {
        if let Some(end) = find_crlf_from(buf, 1) {
            let s = String::from_utf8_lossy(&buf[1..end]).into_owned();
            buf.advance(end + 2);
            Ok(Some(Value::SimpleString(s)))
        } else {
            Ok(None)
        }
    }

    fn parse_error(buf: &mut BytesMut) -> Result<Option<Value>, FrameError> {
        if let Some(end) = find_crlf_from(buf, 1) {
            let s = String::from_utf8_lossy(&buf[1..end]).into_owned();
            buf.advance(end + 2);
            Ok(Some(Value::Error(s)))
        } else {
            Ok(None)
        }
    }

    fn parse_integer(buf: &mut BytesMut) -> Result<Option<Value>, FrameError> {
        if let Some(end) = find_crlf_from(buf, 1) {
            let n = parse_int_field(&buf[1..end])?;
            buf.advance(end + 2);
            Ok(Some(Value::Integer(n)))
        } else {
            Ok(None)
        }
    }

    fn parse_bulk_string(buf: &mut BytesMut) -> Result<Option<Value>, FrameError> {
        let crlf = match find_crlf_from(buf, 1) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let len = parse_int_field(&buf[1..crlf])?;

        if len == -1 {
            buf.advance(crlf + 2);
            return Ok(Some(Value::Null));
        }
        if len < -1 {
            return Err(FrameError::InvalidInteger(format!(
                "bulk string length {len}"
            )));
        }

        let len = len as usize;
        let total = crlf + 2 + len + 2; // header + data + trailing \r\n
        if buf.len() < total {
            return Ok(None);
        }

        if &buf[crlf + 2 + len..total] != b"\r\n" {
            return Err(FrameError::MalformedFrame(
                "missing CRLF after bulk string".to_string(),
            ));
        }

        let data = buf[crlf + 2..crlf + 2 + len].to_vec();
        buf.advance(total);
        Ok(Some(Value::BulkString(data)))
    }

    fn parse_array(buf: &mut BytesMut) -> Result<Option<Value>, FrameError> {
        let crlf = match find_crlf_from(buf, 1) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let count = parse_int_field(&buf[1..crlf])?;
        if count < 0 {
            return Err(FrameError::MalformedFrame(format!(
                "negative array count {count}"
            )));
        }
        let count = count as usize;

        // Elements parse recursively; keep a copy so the buffer can be
        // restored if the tail of the array hasn't arrived yet.
        let saved = buf.clone();
        buf.advance(crlf + 2);

        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            match Self::parse(buf) {
                Ok(Some(val)) => items.push(val),
                Ok(None) => {
                    *buf = saved;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Some(Value::Array(items)))
    }
}

fn parse_int_field(bytes: &[u8]) -> Result<i64, FrameError> {
    let s = std::str::from_utf8(bytes)
        .map_err(|_| FrameError::InvalidInteger("non-UTF-8 digits".to_string()))?;
    s.parse()
        .map_err(|_| FrameError::InvalidInteger(s.to_string()))
}

/// Find \r\n starting from the given position.
fn find_crlf_from(buf: &[u8], start: usize) -> Option<usize> {
    if buf.len() < start + 2 {
        return None;
    }
    for i in start..buf.len() - 1 {
        if buf[i] == b'\r' && buf[i + 1] == b'\n' {
            return Some(i);
        }
    }
    None
}
