//! Large-object handles and the external store contract
//!
//! CLOB/BLOB values are id+length handles; the bytes/characters themselves are
//! owned by an externally supplied store. Every operation that needs the
//! content goes through the [`LobStore`] trait, and accessor failures
//! propagate unchanged as `InvalidLob`/`IoFailure`.

use parking_lot::Mutex;
use quartzdb_diagnostics::{Result, SqlError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// An id+length reference to externally stored large-object content.
///
/// The handle does not own the content; destruction is decided by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LobHandle {
    /// Store-allocated identifier
    pub id: i64,
    /// Length in characters (CLOB) or bytes (BLOB)
    pub length: u64,
}

impl LobHandle {
    /// Create a handle from an id and length
    pub fn new(id: i64, length: u64) -> Self {
        Self { id, length }
    }
}

impl fmt::Display for LobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lob#{}[{}]", self.id, self.length)
    }
}

/// The externally supplied large-object accessor.
///
/// Offsets are zero based. Implementations must not assume the engine retries
/// on failure; it never does.
pub trait LobStore: Send + Sync {
    /// Length in bytes (BLOB) or characters (CLOB)
    fn length(&self, id: i64) -> Result<u64>;

    /// Read a byte range from a BLOB
    fn get_bytes(&self, id: i64, offset: u64, length: u64) -> Result<Vec<u8>>;

    /// Read a character range from a CLOB
    fn get_chars(&self, id: i64, offset: u64, length: u64) -> Result<String>;

    /// Write bytes into a BLOB, extending it if needed; returns the new length
    fn set_bytes(&self, id: i64, offset: u64, bytes: &[u8]) -> Result<u64>;

    /// Write characters into a CLOB, extending it if needed; returns the new length
    fn set_chars(&self, id: i64, offset: u64, chars: &str) -> Result<u64>;

    /// Release the object; subsequent access fails with `InvalidLob`
    fn free(&self, id: i64) -> Result<()>;

    /// Allocate an empty BLOB and return its handle
    fn create_blob(&self, bytes: &[u8]) -> Result<LobHandle>;

    /// Allocate an empty CLOB and return its handle
    fn create_clob(&self, chars: &str) -> Result<LobHandle>;
}

enum LobData {
    Bytes(Vec<u8>),
    Chars(Vec<char>),
}

/// In-process store backed by a map, for tests and embedders without a
/// persistent LOB manager. Ids are allocated monotonically.
pub struct MemoryLobStore {
    next_id: AtomicI64,
    objects: Mutex<HashMap<i64, LobData>>,
}

impl MemoryLobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            objects: Mutex::new(HashMap::new()),
        }
    }

    fn allocate(&self, data: LobData) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.objects.lock().insert(id, data);
        id
    }
}

impl Default for MemoryLobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LobStore for MemoryLobStore {
    fn length(&self, id: i64) -> Result<u64> {
        let objects = self.objects.lock();
        match objects.get(&id) {
            Some(LobData::Bytes(b)) => Ok(b.len() as u64),
            Some(LobData::Chars(c)) => Ok(c.len() as u64),
            None => Err(SqlError::InvalidLob { id }),
        }
    }

    fn get_bytes(&self, id: i64, offset: u64, length: u64) -> Result<Vec<u8>> {
        let objects = self.objects.lock();
        match objects.get(&id) {
            Some(LobData::Bytes(b)) => {
                let start = offset.min(b.len() as u64) as usize;
                let end = (offset + length).min(b.len() as u64) as usize;
                Ok(b[start..end].to_vec())
            }
            Some(LobData::Chars(_)) => Err(SqlError::IoFailure {
                message: format!("lob {} holds characters, not bytes", id),
            }),
            None => Err(SqlError::InvalidLob { id }),
        }
    }

    fn get_chars(&self, id: i64, offset: u64, length: u64) -> Result<String> {
        let objects = self.objects.lock();
        match objects.get(&id) {
            Some(LobData::Chars(c)) => {
                let start = offset.min(c.len() as u64) as usize;
                let end = (offset + length).min(c.len() as u64) as usize;
                Ok(c[start..end].iter().collect())
            }
            Some(LobData::Bytes(_)) => Err(SqlError::IoFailure {
                message: format!("lob {} holds bytes, not characters", id),
            }),
            None => Err(SqlError::InvalidLob { id }),
        }
    }

    fn set_bytes(&self, id: i64, offset: u64, bytes: &[u8]) -> Result<u64> {
        let mut objects = self.objects.lock();
        match objects.get_mut(&id) {
            Some(LobData::Bytes(b)) => {
                let end = offset as usize + bytes.len();
                if b.len() < end {
                    b.resize(end, 0);
                }
                b[offset as usize..end].copy_from_slice(bytes);
                Ok(b.len() as u64)
            }
            Some(LobData::Chars(_)) => Err(SqlError::IoFailure {
                message: format!("lob {} holds characters, not bytes", id),
            }),
            None => Err(SqlError::InvalidLob { id }),
        }
    }

    fn set_chars(&self, id: i64, offset: u64, chars: &str) -> Result<u64> {
        let mut objects = self.objects.lock();
        match objects.get_mut(&id) {
            Some(LobData::Chars(c)) => {
                let new: Vec<char> = chars.chars().collect();
                let end = offset as usize + new.len();
                if c.len() < end {
                    c.resize(end, ' ');
                }
                c[offset as usize..end].copy_from_slice(&new);
                Ok(c.len() as u64)
            }
            Some(LobData::Bytes(_)) => Err(SqlError::IoFailure {
                message: format!("lob {} holds bytes, not characters", id),
            }),
            None => Err(SqlError::InvalidLob { id }),
        }
    }

    fn free(&self, id: i64) -> Result<()> {
        match self.objects.lock().remove(&id) {
            Some(_) => Ok(()),
            None => Err(SqlError::InvalidLob { id }),
        }
    }

    fn create_blob(&self, bytes: &[u8]) -> Result<LobHandle> {
        let length = bytes.len() as u64;
        let id = self.allocate(LobData::Bytes(bytes.to_vec()));
        Ok(LobHandle::new(id, length))
    }

    fn create_clob(&self, chars: &str) -> Result<LobHandle> {
        let data: Vec<char> = chars.chars().collect();
        let length = data.len() as u64;
        let id = self.allocate(LobData::Chars(data));
        Ok(LobHandle::new(id, length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_round_trip() {
        let store = MemoryLobStore::new();
        let handle = store.create_blob(b"\x01\x02\x03").unwrap();
        assert_eq!(handle.length, 3);
        assert_eq!(store.get_bytes(handle.id, 1, 2).unwrap(), vec![2, 3]);
        assert_eq!(store.length(handle.id).unwrap(), 3);
    }

    #[test]
    fn test_clob_substring_range_clamped() {
        let store = MemoryLobStore::new();
        let handle = store.create_clob("hello").unwrap();
        assert_eq!(store.get_chars(handle.id, 3, 10).unwrap(), "lo");
        assert_eq!(store.get_chars(handle.id, 10, 2).unwrap(), "");
    }

    #[test]
    fn test_freed_lob_is_invalid() {
        let store = MemoryLobStore::new();
        let handle = store.create_blob(b"x").unwrap();
        store.free(handle.id).unwrap();
        assert_eq!(
            store.length(handle.id),
            Err(SqlError::InvalidLob { id: handle.id })
        );
    }

    #[test]
    fn test_ids_are_monotonic() {
        let store = MemoryLobStore::new();
        let a = store.create_blob(b"").unwrap();
        let b = store.create_clob("").unwrap();
        assert!(b.id > a.id);
    }
}
