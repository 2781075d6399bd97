//! SQLite-based store implementation

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use stylehold_api::{HoldFilter, HoldRecord, HoldStatus};
use stylehold_util::{ClientId, HoldId, StylistId, Timestamp, WallClock};
use tracing::{debug, warn};

use crate::{AuditEvent, AuditEventType, Store, StoreError, StoreResult};

const HOLD_COLUMNS: &str = "id, stylist_id, client_id, booking_date, booking_time, \
                            appointment_at, created_at, expires_at, status";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Holds; timestamps are epoch milliseconds
            CREATE TABLE IF NOT EXISTS holds (
                id TEXT PRIMARY KEY,
                stylist_id TEXT NOT NULL,
                client_id TEXT NOT NULL,
                booking_date TEXT NOT NULL,
                booking_time TEXT NOT NULL,
                appointment_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                status TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            CREATE INDEX IF NOT EXISTS idx_holds_slot ON holds(stylist_id, booking_date, booking_time);
            CREATE INDEX IF NOT EXISTS idx_holds_status_expiry ON holds(status, expires_at);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

/// Hold columns as stored, before parsing back into typed fields
struct HoldRow {
    id: String,
    stylist_id: String,
    client_id: String,
    booking_date: String,
    booking_time: String,
    appointment_at: i64,
    created_at: i64,
    expires_at: i64,
    status: String,
}

impl HoldRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            stylist_id: row.get(1)?,
            client_id: row.get(2)?,
            booking_date: row.get(3)?,
            booking_time: row.get(4)?,
            appointment_at: row.get(5)?,
            created_at: row.get(6)?,
            expires_at: row.get(7)?,
            status: row.get(8)?,
        })
    }

    fn into_record(self) -> StoreResult<HoldRecord> {
        let corrupt = |field: &'static str, message: String| StoreError::CorruptHold {
            id: self.id.clone(),
            field,
            message,
        };

        Ok(HoldRecord {
            id: self
                .id
                .parse::<HoldId>()
                .map_err(|e| corrupt("id", e.to_string()))?,
            stylist_id: StylistId::new(self.stylist_id.clone()),
            client_id: ClientId::new(self.client_id.clone()),
            booking_date: NaiveDate::parse_from_str(&self.booking_date, DATE_FORMAT)
                .map_err(|e| corrupt("booking_date", e.to_string()))?,
            booking_time: WallClock::parse(&self.booking_time)
                .map_err(|e| corrupt("booking_time", e.to_string()))?,
            appointment_at: Timestamp::from_millis(self.appointment_at),
            created_at: Timestamp::from_millis(self.created_at),
            expires_at: Timestamp::from_millis(self.expires_at),
            status: self
                .status
                .parse::<HoldStatus>()
                .map_err(|e| corrupt("status", e.to_string()))?,
        })
    }
}

fn into_records(rows: Vec<HoldRow>) -> StoreResult<Vec<HoldRecord>> {
    rows.into_iter().map(HoldRow::into_record).collect()
}

impl Store for SqliteStore {
    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.as_millis(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp: i64 = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp, event_json) = row?;
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp: Timestamp::from_millis(timestamp),
                event,
            });
        }

        Ok(events)
    }

    fn claim_slot(&self, hold: &HoldRecord, now: Timestamp) -> StoreResult<Option<HoldRecord>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let booking_date = hold.booking_date.format(DATE_FORMAT).to_string();
        let booking_time = hold.booking_time.to_string();

        let existing = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {HOLD_COLUMNS} FROM holds \
                 WHERE stylist_id = ? AND booking_date = ? AND booking_time = ? \
                 AND status IN (?, ?)"
            ))?;
            let rows = stmt.query_map(
                params![
                    hold.stylist_id.as_str(),
                    booking_date,
                    booking_time,
                    HoldStatus::Pending.as_str(),
                    HoldStatus::Confirmed.as_str(),
                ],
                HoldRow::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        if let Some(blocking) = into_records(existing)?
            .into_iter()
            .find(|h| h.is_live_at(now))
        {
            debug!(
                hold_id = %hold.id,
                blocking_hold_id = %blocking.id,
                "Slot already held"
            );
            return Ok(Some(blocking));
        }

        tx.execute(
            &format!("INSERT INTO holds ({HOLD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                hold.id.to_string(),
                hold.stylist_id.as_str(),
                hold.client_id.as_str(),
                booking_date,
                booking_time,
                hold.appointment_at.as_millis(),
                hold.created_at.as_millis(),
                hold.expires_at.as_millis(),
                hold.status.as_str(),
            ],
        )?;
        tx.commit()?;

        debug!(hold_id = %hold.id, stylist_id = %hold.stylist_id, "Hold inserted");
        Ok(None)
    }

    fn get_hold(&self, id: &HoldId) -> StoreResult<Option<HoldRecord>> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                &format!("SELECT {HOLD_COLUMNS} FROM holds WHERE id = ?"),
                [id.to_string()],
                HoldRow::from_row,
            )
            .optional()?;

        row.map(HoldRow::into_record).transpose()
    }

    fn transition_hold(&self, id: &HoldId, from: HoldStatus, to: HoldStatus) -> StoreResult<bool> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE holds SET status = ? WHERE id = ? AND status = ?",
            params![to.as_str(), id.to_string(), from.as_str()],
        )?;

        if changed == 0 {
            let exists: Option<i64> = conn
                .query_row("SELECT 1 FROM holds WHERE id = ?", [id.to_string()], |row| {
                    row.get(0)
                })
                .optional()?;
            if exists.is_none() {
                return Err(StoreError::NotFound(format!("hold {}", id)));
            }
            return Ok(false);
        }

        debug!(hold_id = %id, from = %from, to = %to, "Hold transitioned");
        Ok(true)
    }

    fn list_holds(&self, filter: &HoldFilter) -> StoreResult<Vec<HoldRecord>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {HOLD_COLUMNS} FROM holds WHERE 1 = 1");
        let mut args: Vec<String> = Vec::new();
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(status.as_str().to_string());
        }
        if let Some(stylist_id) = &filter.stylist_id {
            sql.push_str(" AND stylist_id = ?");
            args.push(stylist_id.as_str().to_string());
        }
        sql.push_str(" ORDER BY appointment_at, created_at");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), HoldRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        into_records(rows)
    }

    fn expire_due(&self, now: Timestamp) -> StoreResult<Vec<HoldRecord>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let due = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {HOLD_COLUMNS} FROM holds \
                 WHERE status = ? AND expires_at <= ? ORDER BY expires_at"
            ))?;
            let rows = stmt.query_map(
                params![HoldStatus::Pending.as_str(), now.as_millis()],
                HoldRow::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        tx.execute(
            "UPDATE holds SET status = ? WHERE status = ? AND expires_at <= ?",
            params![
                HoldStatus::Expired.as_str(),
                HoldStatus::Pending.as_str(),
                now.as_millis()
            ],
        )?;
        tx.commit()?;

        let mut expired = into_records(due)?;
        for hold in &mut expired {
            hold.status = HoldStatus::Expired;
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), now = %now, "Pending holds expired");
        }
        Ok(expired)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylehold_api::EventPayload;

    const MINUTE: i64 = 60_000;

    fn make_hold(stylist: &str, time: &str, expires_at: i64) -> HoldRecord {
        HoldRecord {
            id: HoldId::new(),
            stylist_id: StylistId::new(stylist),
            client_id: ClientId::new("client-1"),
            booking_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            booking_time: WallClock::parse(time).unwrap(),
            appointment_at: Timestamp::from_millis(600 * MINUTE),
            created_at: Timestamp::from_millis(0),
            expires_at: Timestamp::from_millis(expires_at),
            status: HoldStatus::Pending,
        }
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_audit_log() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .append_audit(AuditEvent::new(
                AuditEventType::ServiceStarted,
                Timestamp::from_millis(1),
            ))
            .unwrap();
        store
            .append_audit(AuditEvent::new(
                AuditEventType::Hold(EventPayload::HoldReleased {
                    hold_id: HoldId::new(),
                }),
                Timestamp::from_millis(2),
            ))
            .unwrap();

        let events = store.get_recent_audits(10).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].event, AuditEventType::Hold(_)));
        assert!(matches!(events[1].event, AuditEventType::ServiceStarted));
        assert_eq!(events[1].timestamp, Timestamp::from_millis(1));
    }

    #[test]
    fn test_claim_and_get_hold() {
        let store = SqliteStore::in_memory().unwrap();
        let hold = make_hold("ana", "14:30", 120 * MINUTE);

        assert!(store.claim_slot(&hold, Timestamp::from_millis(0)).unwrap().is_none());

        let loaded = store.get_hold(&hold.id).unwrap().unwrap();
        assert_eq!(loaded, hold);
        assert!(store.get_hold(&HoldId::new()).unwrap().is_none());
    }

    #[test]
    fn test_live_hold_blocks_slot() {
        let store = SqliteStore::in_memory().unwrap();
        let now = Timestamp::from_millis(0);
        let first = make_hold("ana", "14:30", 120 * MINUTE);
        store.claim_slot(&first, now).unwrap();

        let second = make_hold("ana", "14:30", 120 * MINUTE);
        let blocking = store.claim_slot(&second, now).unwrap().unwrap();
        assert_eq!(blocking.id, first.id);
        assert!(store.get_hold(&second.id).unwrap().is_none());

        // Different stylist or different time is free
        assert!(store.claim_slot(&make_hold("bea", "14:30", 120 * MINUTE), now).unwrap().is_none());
        assert!(store.claim_slot(&make_hold("ana", "15:00", 120 * MINUTE), now).unwrap().is_none());
    }

    #[test]
    fn test_lapsed_hold_does_not_block() {
        let store = SqliteStore::in_memory().unwrap();
        let first = make_hold("ana", "14:30", 10 * MINUTE);
        store.claim_slot(&first, Timestamp::from_millis(0)).unwrap();

        // Past its deadline but not yet swept
        let later = Timestamp::from_millis(10 * MINUTE);
        let second = make_hold("ana", "14:30", 130 * MINUTE);
        assert!(store.claim_slot(&second, later).unwrap().is_none());
    }

    #[test]
    fn test_transition_hold() {
        let store = SqliteStore::in_memory().unwrap();
        let hold = make_hold("ana", "14:30", 120 * MINUTE);
        store.claim_slot(&hold, Timestamp::from_millis(0)).unwrap();

        assert!(store
            .transition_hold(&hold.id, HoldStatus::Pending, HoldStatus::Confirmed)
            .unwrap());
        assert!(!store
            .transition_hold(&hold.id, HoldStatus::Pending, HoldStatus::Released)
            .unwrap());
        assert_eq!(
            store.get_hold(&hold.id).unwrap().unwrap().status,
            HoldStatus::Confirmed
        );

        assert!(matches!(
            store.transition_hold(&HoldId::new(), HoldStatus::Pending, HoldStatus::Confirmed),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_expire_due() {
        let store = SqliteStore::in_memory().unwrap();
        let now = Timestamp::from_millis(0);
        let soon = make_hold("ana", "10:00", 5 * MINUTE);
        let later = make_hold("ana", "11:00", 50 * MINUTE);
        let confirmed = make_hold("ana", "12:00", 5 * MINUTE);
        for hold in [&soon, &later, &confirmed] {
            store.claim_slot(hold, now).unwrap();
        }
        store
            .transition_hold(&confirmed.id, HoldStatus::Pending, HoldStatus::Confirmed)
            .unwrap();

        let expired = store.expire_due(Timestamp::from_millis(5 * MINUTE)).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, soon.id);
        assert_eq!(expired[0].status, HoldStatus::Expired);

        assert_eq!(store.get_hold(&soon.id).unwrap().unwrap().status, HoldStatus::Expired);
        assert_eq!(store.get_hold(&later.id).unwrap().unwrap().status, HoldStatus::Pending);
        assert_eq!(
            store.get_hold(&confirmed.id).unwrap().unwrap().status,
            HoldStatus::Confirmed
        );

        // Second pass finds nothing new
        assert!(store.expire_due(Timestamp::from_millis(5 * MINUTE)).unwrap().is_empty());
    }

    #[test]
    fn test_list_holds_filters() {
        let store = SqliteStore::in_memory().unwrap();
        let now = Timestamp::from_millis(0);
        let a = make_hold("ana", "10:00", 120 * MINUTE);
        let b = make_hold("bea", "10:00", 120 * MINUTE);
        store.claim_slot(&a, now).unwrap();
        store.claim_slot(&b, now).unwrap();
        store
            .transition_hold(&b.id, HoldStatus::Pending, HoldStatus::Released)
            .unwrap();

        assert_eq!(store.list_holds(&HoldFilter::default()).unwrap().len(), 2);

        let pending = store
            .list_holds(&HoldFilter::with_status(HoldStatus::Pending))
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, a.id);

        let bea = store
            .list_holds(&HoldFilter {
                status: None,
                stylist_id: Some(StylistId::new("bea")),
            })
            .unwrap();
        assert_eq!(bea.len(), 1);
        assert_eq!(bea[0].status, HoldStatus::Released);
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let store = SqliteStore::in_memory().unwrap();
        let hold = make_hold("ana", "14:30", 120 * MINUTE);
        store.claim_slot(&hold, Timestamp::from_millis(0)).unwrap();

        store
            .conn()
            .unwrap()
            .execute("UPDATE holds SET status = 'lost'", [])
            .unwrap();

        assert!(matches!(
            store.get_hold(&hold.id),
            Err(StoreError::CorruptHold { field: "status", .. })
        ));
    }

    #[test]
    fn test_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holds.db");
        let hold = make_hold("ana", "14:30", 120 * MINUTE);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.claim_slot(&hold, Timestamp::from_millis(0)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_hold(&hold.id).unwrap().unwrap(), hold);
    }
}
