use crate::resp::{FrameError, Parser, Value};
use bytes::BytesMut;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum AofError {
    #[error("append only file I/O: {0}")]
    Io(#[from] io::Error),

    #[error("append only file record: {0}")]
    Frame(#[from] FrameError),
}

/// Append-only command log.
///
/// Records are the exact encoded request arrays, concatenated in arrival
/// order. The writer is command-agnostic: the dispatcher decides what gets
/// logged. Callers share it behind a mutex held for the whole of one
/// record's bytes, so an append never interleaves with another append or
/// with the periodic sync.
pub struct AofWriter {
    file: Option<File>,
}

impl AofWriter {
    /// Open or create the log file in append mode.
    pub fn open(path: &str) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(AofWriter { file: Some(file) })
    }

    /// Append one request value to the log.
    pub fn append(&mut self, request: &Value) -> io::Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(io::Error::other("append only file already closed"));
        };
        file.write_all(&request.serialize())
    }

    /// Force buffered writes to stable storage.
    pub fn sync(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.sync_data(),
            None => Ok(()),
        }
    }

    /// Final sync and release of the file handle. Callers must ensure no
    /// append or sync is in flight (the shared mutex does).
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.sync_all();
        }
    }
}

pub type SharedAofWriter = Arc<Mutex<AofWriter>>;

/// Replay the log: decode request values from the file in order and hand
/// each to `apply`. Runs to completion before any connection is accepted.
/// An absent file is an empty log; any decode failure — including a
/// truncated final record — is fatal, since the log is assumed well-formed.
pub async fn replay<F, Fut>(path: &str, mut apply: F) -> Result<usize, AofError>
where
    F: FnMut(Value) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut raw = Vec::new();
    file.read_to_end(&mut raw)?;
    let mut buf = BytesMut::from(&raw[..]);

    let mut count = 0usize;
    while !buf.is_empty() {
        match Parser::parse(&mut buf)? {
            Some(request) => {
                apply(request).await;
                count += 1;
            }
            // Bytes remain but no complete frame does: the log tail was
            // cut mid-record.
            None => return Err(FrameError::Truncated.into()),
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT_LOG: AtomicU32 = AtomicU32::new(0);

    fn temp_log_path() -> String {
        let n = NEXT_LOG.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("cinder-aof-test-{}-{n}.aof", std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    fn set_request(key: &str, value: &str) -> Value {
        Value::array(vec![
            Value::bulk_string(b"SET".to_vec()),
            Value::bulk_string(key.as_bytes().to_vec()),
            Value::bulk_string(value.as_bytes().to_vec()),
        ])
    }

    #[tokio::test]
    async fn test_replay_missing_file_is_empty_log() {
        let path = temp_log_path();
        let count = replay(&path, |_| async {}).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_append_then_replay_in_order() {
        let path = temp_log_path();
        let requests = vec![
            set_request("a", "1"),
            set_request("a", "2"),
            Value::array(vec![
                Value::bulk_string(b"DEL".to_vec()),
                Value::bulk_string(b"a".to_vec()),
            ]),
        ];

        let mut writer = AofWriter::open(&path).unwrap();
        for request in &requests {
            writer.append(request).unwrap();
        }
        writer.sync().unwrap();
        writer.close();

        let mut seen = Vec::new();
        let count = replay(&path, |request| {
            seen.push(request);
            async {}
        })
        .await
        .unwrap();

        assert_eq!(count, 3);
        assert_eq!(seen, requests);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_reopen_appends_after_existing_records() {
        let path = temp_log_path();
        let mut writer = AofWriter::open(&path).unwrap();
        writer.append(&set_request("a", "1")).unwrap();
        writer.close();

        let mut writer = AofWriter::open(&path).unwrap();
        writer.append(&set_request("b", "2")).unwrap();
        writer.close();

        let mut seen = Vec::new();
        replay(&path, |request| {
            seen.push(request);
            async {}
        })
        .await
        .unwrap();
        assert_eq!(seen, vec![set_request("a", "1"), set_request("b", "2")]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_truncated_tail_is_fatal() {
        let path = temp_log_path();
        let mut bytes = set_request("a", "1").serialize();
        bytes.extend_from_slice(b"*2\r\n$3\r\nSET"); // record cut mid-frame
        std::fs::write(&path, bytes).unwrap();

        let result = replay(&path, |_| async {}).await;
        assert!(matches!(
            result,
            Err(AofError::Frame(FrameError::Truncated))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_append_after_close_errors() {
        let path = temp_log_path();
        let mut writer = AofWriter::open(&path).unwrap();
        writer.close();
        assert!(writer.append(&set_request("a", "1")).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
