//! Hold lifecycle events

use serde::{Deserialize, Serialize};
use stylehold_util::{ClientId, HoldId, StylistId, Timestamp};

use crate::API_VERSION;

/// Event envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload, timestamp: Timestamp) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp,
            payload,
        }
    }
}

/// All transitions a hold can go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Slot is now held pending confirmation
    HoldPlaced {
        hold_id: HoldId,
        stylist_id: StylistId,
        client_id: ClientId,
        appointment_at: Timestamp,
        expires_at: Timestamp,
    },

    /// Client confirmed in time
    HoldConfirmed { hold_id: HoldId },

    /// Client released the slot
    HoldReleased { hold_id: HoldId },

    /// Deadline passed while pending; the slot can be re-offered
    HoldExpired {
        hold_id: HoldId,
        stylist_id: StylistId,
        expires_at: Timestamp,
    },
}

impl EventPayload {
    pub fn hold_id(&self) -> HoldId {
        match self {
            EventPayload::HoldPlaced { hold_id, .. }
            | EventPayload::HoldConfirmed { hold_id }
            | EventPayload::HoldReleased { hold_id }
            | EventPayload::HoldExpired { hold_id, .. } => *hold_id,
        }
    }
}
