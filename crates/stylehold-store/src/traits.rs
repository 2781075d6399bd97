//! Store trait definitions

use stylehold_api::{HoldFilter, HoldRecord, HoldStatus};
use stylehold_util::{HoldId, Timestamp};

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Holds

    /// Insert `hold` unless another hold still blocks the same stylist slot
    /// at `now`. Returns the blocking hold instead of inserting when there is
    /// one. The check and the insert happen in one transaction.
    fn claim_slot(&self, hold: &HoldRecord, now: Timestamp) -> StoreResult<Option<HoldRecord>>;

    /// Get a hold by ID
    fn get_hold(&self, id: &HoldId) -> StoreResult<Option<HoldRecord>>;

    /// Move a hold from `from` to `to`. Returns false if the hold was no
    /// longer in `from` (someone else transitioned it first).
    fn transition_hold(&self, id: &HoldId, from: HoldStatus, to: HoldStatus) -> StoreResult<bool>;

    /// List holds matching `filter`, ordered by appointment time
    fn list_holds(&self, filter: &HoldFilter) -> StoreResult<Vec<HoldRecord>>;

    /// Mark every pending hold with `expires_at <= now` as expired and
    /// return them (with their new status)
    fn expire_due(&self, now: Timestamp) -> StoreResult<Vec<HoldRecord>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
