use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::debug;

use common::time::{format_ts, parse_ts};
use common::{Error, Result, Side, Trade, TradeResult};

/// Persistent trade history, one row per trade, backed by SQLite.
///
/// Writes for a given instrument must be serialized: callers hold the
/// instrument lock for the whole evaluate-and-persist section so that no
/// two cycles can resolve the same pending trade.
pub struct TradeLedger {
    pool: SqlitePool,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TradeLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Per-instrument writer lock. The guard must be held across a full
    /// resume-and-persist pass.
    pub async fn instrument_lock(&self, instrument: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(instrument.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn create(&self, trade: &Trade) -> Result<()> {
        let start_time = format_ts(trade.start_time);
        let close_time = trade.close_time.map(format_ts);
        let side = trade.side.to_string();
        let result = trade.result.map(|r| r.to_string());

        sqlx::query(
            r#"
            INSERT INTO trades
                (id, instrument, start_time, close_time, entry_price,
                 stop_loss, take_profit, side, result, gain_pct)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&trade.id)
        .bind(&trade.instrument)
        .bind(start_time)
        .bind(close_time)
        .bind(trade.entry_price)
        .bind(trade.stop_loss)
        .bind(trade.take_profit)
        .bind(side)
        .bind(result)
        .bind(trade.gain_pct)
        .execute(&self.pool)
        .await?;

        debug!(instrument = %trade.instrument, id = %trade.id, "Trade persisted");
        Ok(())
    }

    /// All trades for an instrument, ordered by start time ascending.
    pub async fn list(&self, instrument: &str) -> Result<Vec<Trade>> {
        let rows = sqlx::query(
            r#"
            SELECT id, instrument, start_time, close_time, entry_price,
                   stop_loss, take_profit, side, result, gain_pct
            FROM trades
            WHERE instrument = ?1
            ORDER BY start_time ASC
            "#,
        )
        .bind(instrument)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_trade).collect()
    }

    /// Most recent trade for an instrument, by start time.
    pub async fn latest(&self, instrument: &str) -> Result<Option<Trade>> {
        let row = sqlx::query(
            r#"
            SELECT id, instrument, start_time, close_time, entry_price,
                   stop_loss, take_profit, side, result, gain_pct
            FROM trades
            WHERE instrument = ?1
            ORDER BY start_time DESC
            LIMIT 1
            "#,
        )
        .bind(instrument)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_trade).transpose()
    }

    /// Fill in close time, result and gain of a pending trade.
    ///
    /// Guarded by `close_time IS NULL`: touching an already-closed row is a
    /// ledger-write error, never a silent overwrite.
    pub async fn resolve(
        &self,
        id: &str,
        close_time: NaiveDateTime,
        result: TradeResult,
        gain_pct: f64,
    ) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE trades
            SET close_time = ?2, result = ?3, gain_pct = ?4
            WHERE id = ?1 AND close_time IS NULL
            "#,
        )
        .bind(id)
        .bind(format_ts(close_time))
        .bind(result.to_string())
        .bind(gain_pct)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated != 1 {
            return Err(Error::LedgerWrite(format!(
                "trade '{id}' is missing or already closed"
            )));
        }
        Ok(())
    }
}

fn row_to_trade(row: &sqlx::sqlite::SqliteRow) -> Result<Trade> {
    let start_time: String = row.get("start_time");
    let close_time: Option<String> = row.get("close_time");
    let side: String = row.get("side");
    let result: Option<String> = row.get("result");

    Ok(Trade {
        id: row.get("id"),
        instrument: row.get("instrument"),
        start_time: parse_ts(&start_time)?,
        close_time: close_time.as_deref().map(parse_ts).transpose()?,
        entry_price: row.get("entry_price"),
        stop_loss: row.get("stop_loss"),
        take_profit: row.get("take_profit"),
        side: Side::from_str(&side).map_err(Error::Other)?,
        result: result
            .as_deref()
            .map(TradeResult::from_str)
            .transpose()
            .map_err(Error::Other)?,
        gain_pct: row.get("gain_pct"),
    })
}
