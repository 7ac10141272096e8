use std::time::{SystemTime, UNIX_EPOCH};

/// An entry in the keyspace — a byte-string value with optional expiry.
#[derive(Debug, Clone)]
pub struct Entry {
    pub value: Vec<u8>,
    /// Expiry time as milliseconds since UNIX epoch. None = no expiry.
    pub expires_at: Option<u64>,
}

impl Entry {
    pub fn new(value: Vec<u8>) -> Self {
        Entry {
            value,
            expires_at: None,
        }
    }

    pub fn with_expiry(value: Vec<u8>, expires_at: u64) -> Self {
        Entry {
            value,
            expires_at: Some(expires_at),
        }
    }

    /// Check if this entry has expired.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => now_millis() >= exp,
            None => false,
        }
    }

    /// Time-to-live in whole seconds (floor), or -1 if no expiry, or -2 if
    /// expired. A key expiring within the current second reports 0.
    pub fn ttl_seconds(&self) -> i64 {
        match self.expires_at {
            None => -1,
            Some(exp) => {
                let now = now_millis();
                if now >= exp { -2 } else { ((exp - now) / 1000) as i64 }
            }
        }
    }
}

/// Get current time in milliseconds since UNIX epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_millis() as u64
}
