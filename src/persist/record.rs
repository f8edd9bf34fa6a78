//! Stored record layout.
//!
//! `[value length: u32 LE][value bytes][expiry: i64 LE unix seconds]`, where
//! an expiry of `0` means the record never expires.

use crate::error::{Result, StoreError};

const LEN_PREFIX: usize = 4;
const EXPIRY_SUFFIX: usize = 8;

/// A value as written to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub value: Vec<u8>,
    /// Absolute expiry in Unix seconds
    pub expires_at: Option<u64>,
}

/// Absolute expiry in whole seconds for a TTL starting at `now_ms`.
///
/// Rounds up so a record never expires before its full TTL has elapsed.
/// A TTL of 0 means no expiry.
pub fn expiry_from_ttl(ttl_secs: u64, now_ms: u64) -> Option<u64> {
    if ttl_secs == 0 {
        return None;
    }
    let deadline_ms = now_ms.saturating_add(ttl_secs.saturating_mul(1000));
    Some(deadline_ms.div_ceil(1000))
}

impl Record {
    pub fn new(value: Vec<u8>, expires_at: Option<u64>) -> Self {
        Self { value, expires_at }
    }

    /// Expiry in Unix milliseconds, the unit the cache works in.
    pub fn expires_at_ms(&self) -> Option<u64> {
        self.expires_at.map(|secs| secs.saturating_mul(1000))
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at_ms() {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let len = u32::try_from(self.value.len()).map_err(|_| {
            StoreError::BadValue(format!("value of {} bytes is too large", self.value.len()))
        })?;
        let expiry = match self.expires_at {
            Some(secs) => i64::try_from(secs)
                .map_err(|_| StoreError::BadValue(format!("expiry {secs} out of range")))?,
            None => 0,
        };

        let mut buf = Vec::with_capacity(LEN_PREFIX + self.value.len() + EXPIRY_SUFFIX);
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&self.value);
        buf.extend_from_slice(&expiry.to_le_bytes());
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let truncated = || StoreError::BadValue(format!("truncated record of {} bytes", bytes.len()));

        let (len_bytes, rest) = bytes.split_first_chunk::<LEN_PREFIX>().ok_or_else(truncated)?;
        let len = usize::try_from(u32::from_le_bytes(*len_bytes))
            .ok()
            .and_then(|len| len.checked_add(EXPIRY_SUFFIX).map(|total| (len, total)));
        let Some((len, total)) = len else {
            return Err(StoreError::BadValue(
                "record length prefix exceeds addressable size".to_string(),
            ));
        };
        if rest.len() != total {
            return Err(StoreError::BadValue(format!(
                "record declares {len} value bytes but holds {}",
                rest.len().saturating_sub(EXPIRY_SUFFIX)
            )));
        }

        let (value, expiry_bytes) = rest.split_at(len);
        let expiry_bytes: [u8; EXPIRY_SUFFIX] = expiry_bytes.try_into().map_err(|_| truncated())?;
        let expiry = i64::from_le_bytes(expiry_bytes);
        let expires_at = match expiry {
            0 => None,
            secs if secs > 0 => Some(secs as u64),
            secs => return Err(StoreError::BadValue(format!("negative expiry {secs}"))),
        };

        Ok(Self {
            value: value.to_vec(),
            expires_at,
        })
    }
}
