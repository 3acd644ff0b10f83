//! Session context consumed by the type engine
//!
//! Datetime conversions and CURRENT_* derivations need a timezone and a
//! clock, and LOB-producing conversions need a store; both are supplied by
//! the caller through [`SessionContext`]. Calendar scratch state is always
//! stack-local inside the engine, so a context can be shared read-only across
//! threads.

use crate::lob::{LobHandle, LobStore, MemoryLobStore};
use crate::value::SqlDateTime;
use quartzdb_diagnostics::Result;

/// Maximum zone displacement accepted from a context, ±14:00
pub const MAX_ZONE_OFFSET_SECONDS: i32 = 14 * 3600;

/// The collaborator contract the engine consumes from the session layer
pub trait SessionContext {
    /// Zone offset in seconds for the given UTC instant.
    ///
    /// Implementations backed by a named timezone may return different
    /// offsets for different instants; the engine clamps the result to
    /// ±[`MAX_ZONE_OFFSET_SECONDS`].
    fn zone_offset_seconds(&self, epoch_seconds: i64) -> i32;

    /// The session clock, as a UTC timestamp payload
    fn current_timestamp(&self) -> SqlDateTime;

    /// The large-object store serving this session
    fn lob_store(&self) -> &dyn LobStore;

    /// Create a CLOB from characters via the store
    fn create_clob(&self, chars: &str) -> Result<LobHandle> {
        self.lob_store().create_clob(chars)
    }

    /// Create a BLOB from bytes via the store
    fn create_blob(&self, bytes: &[u8]) -> Result<LobHandle> {
        self.lob_store().create_blob(bytes)
    }
}

/// A session with a fixed zone offset and an injectable clock, sufficient for
/// an embedded database without timezone rule data.
pub struct FixedOffsetSession {
    zone_offset_seconds: i32,
    now_epoch_seconds: i64,
    store: MemoryLobStore,
}

impl FixedOffsetSession {
    /// Create a session at the given offset; the clock starts at the epoch
    pub fn new(zone_offset_seconds: i32) -> Self {
        Self {
            zone_offset_seconds: zone_offset_seconds
                .clamp(-MAX_ZONE_OFFSET_SECONDS, MAX_ZONE_OFFSET_SECONDS),
            now_epoch_seconds: 0,
            store: MemoryLobStore::new(),
        }
    }

    /// A UTC session
    pub fn utc() -> Self {
        Self::new(0)
    }

    /// Pin the session clock to a UTC instant
    pub fn with_clock(mut self, now_epoch_seconds: i64) -> Self {
        self.now_epoch_seconds = now_epoch_seconds;
        self
    }
}

impl SessionContext for FixedOffsetSession {
    fn zone_offset_seconds(&self, _epoch_seconds: i64) -> i32 {
        self.zone_offset_seconds
    }

    fn current_timestamp(&self) -> SqlDateTime {
        SqlDateTime::new(self.now_epoch_seconds, 0, self.zone_offset_seconds)
    }

    fn lob_store(&self) -> &dyn LobStore {
        &self.store
    }
}
