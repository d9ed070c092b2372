use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One OHLCV observation for a fixed interval.
/// Bars are immutable once observed, ordered by time, no duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Direction of a trade.
///
/// Persisted as "Buy"/"Sell" to stay compatible with the historical
/// ledger schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum Side {
    #[sqlx(rename = "Buy")]
    Long,
    #[sqlx(rename = "Sell")]
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "Buy"),
            Side::Short => write!(f, "Sell"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buy" => Ok(Side::Long),
            "Sell" => Ok(Side::Short),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

/// Terminal outcome of a trade. A pending trade has no result yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeResult {
    Win,
    Lose,
}

impl std::fmt::Display for TradeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeResult::Win => write!(f, "win"),
            TradeResult::Lose => write!(f, "lose"),
        }
    }
}

impl std::str::FromStr for TradeResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(TradeResult::Win),
            "lose" => Ok(TradeResult::Lose),
            other => Err(format!("unknown trade result '{other}'")),
        }
    }
}

/// A bar plus the derived series computed by the indicator engine.
/// Fields are `None` during warmup (insufficient history for the lookback).
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub bar: Bar,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub avg_volume: Option<f64>,
    /// Close-to-close change from the previous bar, in percent.
    pub momentum_pct: Option<f64>,
    /// Distance between fast and slow EMA relative to the slow EMA, in percent.
    pub trend_strength_pct: Option<f64>,
}

/// A rising-edge trading opportunity with side and bracket levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub time: NaiveDateTime,
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// A simulated position from entry until resolution (or still pending).
///
/// Owned by the ledger. A trade with `close_time == None` is the only
/// mutable record; once closed it is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub instrument: String,
    pub start_time: NaiveDateTime,
    pub close_time: Option<NaiveDateTime>,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub side: Side,
    pub result: Option<TradeResult>,
    pub gain_pct: f64,
}

impl Trade {
    /// Open a new pending trade from an entry signal.
    pub fn open(instrument: impl Into<String>, signal: &EntrySignal) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            instrument: instrument.into(),
            start_time: signal.time,
            close_time: None,
            entry_price: signal.entry_price,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            side: signal.side,
            result: None,
            gain_pct: 0.0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.close_time.is_none()
    }
}

/// Kind of a streak run over the real-trade subsequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakKind {
    WinRun,
    LossRun,
}

/// A maximal run of consecutive same-result real trades. Derived, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakSegment {
    pub kind: StreakKind,
    pub count: usize,
}

/// Capital-allocation output of the sizing engine. Derived per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizingDecision {
    pub base_capital: f64,
    pub multiplier: u32,
    pub recovery_trades: u32,
}

/// Bracket levels handed to the external order-placement collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderIntent {
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}
