//! Audit event types

use serde::{Deserialize, Serialize};
use stylehold_api::EventPayload;
use stylehold_util::Timestamp;

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Sweeper service started
    ServiceStarted,

    /// Sweeper service stopped
    ServiceStopped,

    /// Policy loaded/reloaded
    PolicyLoaded { stylist_count: usize },

    /// A hold changed state
    Hold(EventPayload),

    /// A sweep pass finished
    SweepCompleted { expired_count: usize },
}

/// Full audit event with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: Timestamp,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType, timestamp: Timestamp) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylehold_util::HoldId;

    #[test]
    fn hold_audit_keeps_both_tags() {
        let hold_id = HoldId::new();
        let event = AuditEventType::Hold(EventPayload::HoldReleased { hold_id });

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "hold");
        assert_eq!(json["type"], "hold_released");

        let back: AuditEventType = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
