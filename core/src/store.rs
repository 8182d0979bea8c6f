//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! Exporters call store methods; they never execute SQL directly.

use rusqlite::{params, types::Value, Connection};
use crate::{
    dataset::{CostCell, DatasetRow},
    error::GenResult,
    event::EventLogEntry,
};

pub struct DatasetStore {
    conn: Connection,
}

impl DatasetStore {
    /// Open (or create) the dataset database at `path`.
    pub fn open(path: &str) -> GenResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GenResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GenResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_dataset.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        seed: u64,
        version: &str,
        merchant_count: usize,
        config_json: &str,
    ) -> GenResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, merchant_count, config_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            // SQLite integers are signed; the seed round-trips bit-for-bit.
            params![run_id, seed as i64, version, merchant_count as i64, config_json],
        )?;
        Ok(())
    }

    pub fn run_seed(&self, run_id: &str) -> GenResult<Option<u64>> {
        let mut stmt = self.conn.prepare("SELECT seed FROM run WHERE run_id = ?1")?;
        let seed = stmt
            .query_row(params![run_id], |row| row.get::<_, i64>(0))
            .map(|s| s as u64);
        match seed {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ── Rows ───────────────────────────────────────────────────

    /// Insert all rows in one transaction, indexed by table position.
    pub fn insert_rows(&self, run_id: &str, rows: &[DatasetRow]) -> GenResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO merchant_month (
                    run_id, row_index, merchant_id, month, merchant_industry,
                    merchant_governorate, subscription_plan, acquisition_channel,
                    customer_acquisition_cost, mrr, new_mrr, expansion_mrr,
                    churned_mrr, active_status, total_payment_volume, transaction_count
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            )?;
            for (i, r) in rows.iter().enumerate() {
                stmt.execute(params![
                    run_id,
                    i as i64,
                    r.merchant_id,
                    r.month,
                    r.merchant_industry,
                    r.merchant_governorate,
                    r.subscription_plan,
                    r.acquisition_channel,
                    cost_to_sql(&r.customer_acquisition_cost),
                    r.mrr,
                    r.new_mrr,
                    r.expansion_mrr,
                    r.churned_mrr,
                    r.active_status,
                    r.total_payment_volume,
                    r.transaction_count,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn row_count(&self, run_id: &str) -> GenResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM merchant_month WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn rows(&self, run_id: &str) -> GenResult<Vec<DatasetRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT merchant_id, month, merchant_industry, merchant_governorate,
                    subscription_plan, acquisition_channel, customer_acquisition_cost,
                    mrr, new_mrr, expansion_mrr, churned_mrr, active_status,
                    total_payment_volume, transaction_count
             FROM merchant_month WHERE run_id = ?1
             ORDER BY row_index ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(DatasetRow {
                    merchant_id:               row.get(0)?,
                    month:                     row.get(1)?,
                    merchant_industry:         row.get(2)?,
                    merchant_governorate:      row.get(3)?,
                    subscription_plan:         row.get(4)?,
                    acquisition_channel:       row.get(5)?,
                    customer_acquisition_cost: cost_from_sql(row.get(6)?),
                    mrr:                       row.get(7)?,
                    new_mrr:                   row.get(8)?,
                    expansion_mrr:             row.get(9)?,
                    churned_mrr:               row.get(10)?,
                    active_status:             row.get(11)?,
                    total_payment_volume:      row.get(12)?,
                    transaction_count:         row.get(13)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Rows whose acquisition cost was stored as text.
    pub fn text_cost_count(&self, run_id: &str) -> GenResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM merchant_month
             WHERE run_id = ?1 AND typeof(customer_acquisition_cost) = 'text'",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_events(&self, entries: &[EventLogEntry]) -> GenResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO event_log (run_id, seq, stage, event_type, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for e in entries {
                stmt.execute(params![e.run_id, e.seq as i64, e.stage, e.event_type, e.payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn events(&self, run_id: &str) -> GenResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, stage, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    seq:        row.get::<_, i64>(2)? as u64,
                    stage:      row.get(3)?,
                    event_type: row.get(4)?,
                    payload:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> GenResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn cost_to_sql(cell: &CostCell) -> Value {
    match cell {
        CostCell::Amount(v) => Value::Real(*v),
        CostCell::Text(s) => Value::Text(s.clone()),
    }
}

fn cost_from_sql(value: Value) -> CostCell {
    match value {
        Value::Real(v) => CostCell::Amount(v),
        Value::Integer(i) => CostCell::Amount(i as f64),
        Value::Text(s) => CostCell::Text(s),
        Value::Null | Value::Blob(_) => CostCell::Text(String::new()),
    }
}
