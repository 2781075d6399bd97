//! Hold manager: places, confirms, releases and sweeps holds

use chrono::{Local, TimeZone};
use std::sync::Arc;
use stylehold_api::{Event, EventPayload, HoldFilter, HoldRecord, HoldRequest, HoldStatus};
use stylehold_config::Policy;
use stylehold_store::{AuditEvent, AuditEventType, Store};
use stylehold_util::{Clock, HoldError, HoldId, Result, StylistId, Timestamp};
use tracing::{debug, info, warn};

use crate::{BookingSlot, resolve_expiry};

/// Owns the hold lifecycle.
///
/// Appointment times are resolved in `Tz`, which is the business timezone
/// (the host's local zone unless built with [`HoldManager::with_timezone`]).
pub struct HoldManager<Tz: TimeZone = Local> {
    policy: Policy,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl HoldManager<Local> {
    /// Create a hold manager resolving appointments in local time
    pub fn new(policy: Policy, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self::with_timezone(policy, store, clock, Local)
    }
}

impl<Tz: TimeZone> HoldManager<Tz> {
    pub fn with_timezone(policy: Policy, store: Arc<dyn Store>, clock: Arc<dyn Clock>, tz: Tz) -> Self {
        debug!(
            stylist_count = policy.stylists.len(),
            buffer_minutes = policy.expiry.buffer_minutes,
            default_window_minutes = policy.expiry.default_window_minutes,
            "Hold manager initialized"
        );

        Self {
            policy,
            store,
            clock,
            tz,
        }
    }

    /// Get current policy
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Swap in a new policy. Existing holds keep the expiry they were given.
    pub fn reload_policy(&mut self, policy: Policy) {
        let stylist_count = policy.stylists.len();
        self.policy = policy;
        self.audit(AuditEventType::PolicyLoaded { stylist_count });
        info!(stylist_count, "Policy reloaded");
    }

    /// When a hold placed right now for this slot would expire
    pub fn quote_expiry(
        &self,
        stylist_id: &StylistId,
        booking_date: &str,
        booking_time: &str,
    ) -> Result<Timestamp> {
        let policy = self.policy.expiry_for(stylist_id);
        crate::compute_booking_expiry_in(booking_date, booking_time, &policy, self.clock.now(), &self.tz)
    }

    /// Place a pending hold on a stylist slot
    pub fn place_hold(&self, request: &HoldRequest) -> Result<HoldRecord> {
        let slot = BookingSlot::parse(&request.booking_date, &request.booking_time)?;
        let appointment_at = slot.appointment_in(&self.tz)?;
        let now = self.clock.now();

        let policy = self.policy.expiry_for(&request.stylist_id);
        let expiry = resolve_expiry(appointment_at, now, &policy);

        if expiry.expires_at <= now {
            debug!(
                stylist_id = %request.stylist_id,
                slot = %slot,
                expires_at = %expiry.expires_at,
                "Hold rejected: no time left to confirm"
            );
            return Err(HoldError::HoldWouldExpireImmediately {
                appointment_at,
                expires_at: expiry.expires_at,
            });
        }

        let hold = HoldRecord {
            id: HoldId::new(),
            stylist_id: request.stylist_id.clone(),
            client_id: request.client_id.clone(),
            booking_date: slot.date(),
            booking_time: slot.time(),
            appointment_at,
            created_at: now,
            expires_at: expiry.expires_at,
            status: HoldStatus::Pending,
        };

        if let Some(blocking) = self.store.claim_slot(&hold, now)? {
            debug!(blocking_hold_id = %blocking.id, slot = %slot, "Slot unavailable");
            return Err(HoldError::SlotUnavailable {
                stylist_id: hold.stylist_id,
                date: hold.booking_date,
                time: hold.booking_time,
            });
        }

        info!(
            hold_id = %hold.id,
            stylist_id = %hold.stylist_id,
            client_id = %hold.client_id,
            slot = %slot,
            expires_at = %hold.expires_at,
            bound = expiry.bound.as_str(),
            "Hold placed"
        );

        self.audit(AuditEventType::Hold(EventPayload::HoldPlaced {
            hold_id: hold.id,
            stylist_id: hold.stylist_id.clone(),
            client_id: hold.client_id.clone(),
            appointment_at: hold.appointment_at,
            expires_at: hold.expires_at,
        }));

        Ok(hold)
    }

    /// Confirm a pending hold before it expires
    pub fn confirm_hold(&self, id: &HoldId) -> Result<HoldRecord> {
        let hold = self.finish_pending(id, HoldStatus::Confirmed)?;
        info!(hold_id = %id, stylist_id = %hold.stylist_id, "Hold confirmed");
        self.audit(AuditEventType::Hold(EventPayload::HoldConfirmed { hold_id: *id }));
        Ok(hold)
    }

    /// Give a pending hold back before it expires
    pub fn release_hold(&self, id: &HoldId) -> Result<HoldRecord> {
        let hold = self.finish_pending(id, HoldStatus::Released)?;
        info!(hold_id = %id, stylist_id = %hold.stylist_id, "Hold released");
        self.audit(AuditEventType::Hold(EventPayload::HoldReleased { hold_id: *id }));
        Ok(hold)
    }

    /// Expire every pending hold whose deadline has passed
    pub fn sweep_expired(&self) -> Result<Vec<Event>> {
        let now = self.clock.now();
        let expired = self.store.expire_due(now)?;

        let events: Vec<Event> = expired
            .iter()
            .map(|hold| {
                info!(
                    hold_id = %hold.id,
                    stylist_id = %hold.stylist_id,
                    expires_at = %hold.expires_at,
                    "Hold expired"
                );
                let payload = expired_payload(hold);
                self.audit(AuditEventType::Hold(payload.clone()));
                Event::new(payload, now)
            })
            .collect();

        if !events.is_empty() {
            self.audit(AuditEventType::SweepCompleted {
                expired_count: events.len(),
            });
        }
        debug!(expired_count = events.len(), "Sweep finished");

        Ok(events)
    }

    /// List holds matching `filter`, ordered by appointment time
    pub fn list_holds(&self, filter: &HoldFilter) -> Result<Vec<HoldRecord>> {
        Ok(self.store.list_holds(filter)?)
    }

    pub fn get_hold(&self, id: &HoldId) -> Result<HoldRecord> {
        self.store.get_hold(id)?.ok_or(HoldError::HoldNotFound(*id))
    }

    /// Move a pending, still-live hold to `to`.
    ///
    /// A pending hold past its deadline is expired on the spot and reported
    /// as such, even if no sweep has run yet.
    fn finish_pending(&self, id: &HoldId, to: HoldStatus) -> Result<HoldRecord> {
        let mut hold = self.get_hold(id)?;
        let now = self.clock.now();

        if hold.is_expired_at(now) {
            if !self
                .store
                .transition_hold(id, HoldStatus::Pending, HoldStatus::Expired)?
            {
                return Err(self.lost_race(id));
            }
            info!(hold_id = %id, expires_at = %hold.expires_at, "Hold expired");
            self.audit(AuditEventType::Hold(expired_payload(&hold)));
            return Err(HoldError::HoldExpired(*id));
        }

        if hold.status != HoldStatus::Pending {
            return Err(not_pending(&hold));
        }

        if !self.store.transition_hold(id, HoldStatus::Pending, to)? {
            return Err(self.lost_race(id));
        }

        hold.status = to;
        Ok(hold)
    }

    /// Someone else moved the hold out of Pending first; report where it went
    fn lost_race(&self, id: &HoldId) -> HoldError {
        match self.get_hold(id) {
            Ok(current) => not_pending(&current),
            Err(e) => e,
        }
    }

    fn audit(&self, event: AuditEventType) {
        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(event, self.clock.now()))
        {
            warn!(error = %e, "Failed to append audit event");
        }
    }
}

fn expired_payload(hold: &HoldRecord) -> EventPayload {
    EventPayload::HoldExpired {
        hold_id: hold.id,
        stylist_id: hold.stylist_id.clone(),
        expires_at: hold.expires_at,
    }
}

fn not_pending(hold: &HoldRecord) -> HoldError {
    match hold.status {
        HoldStatus::Expired => HoldError::HoldExpired(hold.id),
        status => HoldError::HoldNotPending {
            id: hold.id,
            status: status.to_string(),
        },
    }
}
