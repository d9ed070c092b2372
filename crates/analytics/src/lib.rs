//! Read-only reporting over a trade history. Recomputes the virtual
//! classification and aggregates win rates and profit figures; nothing
//! here feeds back into trading decisions.

use serde::Serialize;

use common::{Side, Trade, TradeResult};
use risk::SizingParams;

pub const DEFAULT_BROKERAGE_RATE: f64 = 0.001;

/// Aggregated statistics for one instrument's trade history. Field names
/// and the 1-decimal percentage rounding are part of the reporting
/// contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeSummary {
    pub total_trades: usize,
    pub real_trades: usize,
    pub virtual_trades: usize,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub real_win_trades: usize,
    pub real_lose_trades: usize,
    pub buy_total: usize,
    pub buy_win_trades: usize,
    pub buy_lose_trades: usize,
    pub sell_total: usize,
    pub sell_win_trades: usize,
    pub sell_lose_trades: usize,
    pub buy_win_pct: f64,
    pub sell_win_pct: f64,
    pub overall_win_pct: f64,
    pub gross_profit_pct: f64,
    pub brokerage_pct: f64,
    pub net_profit_pct: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn pct(wins: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64 * 100.0
    }
}

/// Summarize an ordered trade history. The brokerage charge is flat per
/// real trade, applied on both entry and exit. Pending trades count
/// toward the total but are neither real nor virtual.
pub fn summarize(trades: &[Trade], brokerage_rate: f64) -> TradeSummary {
    if trades.is_empty() {
        return TradeSummary::default();
    }

    let max_losses = SizingParams::default().max_consecutive_losses;
    let classes = risk::classify(trades, max_losses);

    let real: Vec<&Trade> = classes
        .iter()
        .zip(trades)
        .filter(|(class, _)| **class == Some(false))
        .map(|(_, t)| t)
        .collect();
    let virtual_trades = classes.iter().filter(|c| **c == Some(true)).count();

    let mut max_consecutive_wins = 0usize;
    let mut max_consecutive_losses = 0usize;
    let mut current_wins = 0usize;
    let mut current_losses = 0usize;
    for trade in &real {
        match trade.result {
            Some(TradeResult::Win) => {
                current_wins += 1;
                current_losses = 0;
                max_consecutive_wins = max_consecutive_wins.max(current_wins);
            }
            Some(TradeResult::Lose) => {
                current_losses += 1;
                current_wins = 0;
                max_consecutive_losses = max_consecutive_losses.max(current_losses);
            }
            None => {}
        }
    }

    let count_side = |side: Side, result: TradeResult| {
        real.iter()
            .filter(|t| t.side == side && t.result == Some(result))
            .count()
    };
    let buy_total = real.iter().filter(|t| t.side == Side::Long).count();
    let sell_total = real.iter().filter(|t| t.side == Side::Short).count();
    let buy_win_trades = count_side(Side::Long, TradeResult::Win);
    let buy_lose_trades = count_side(Side::Long, TradeResult::Lose);
    let sell_win_trades = count_side(Side::Short, TradeResult::Win);
    let sell_lose_trades = count_side(Side::Short, TradeResult::Lose);
    let real_win_trades = buy_win_trades + sell_win_trades;
    let real_lose_trades = buy_lose_trades + sell_lose_trades;

    let gross_profit_pct: f64 = real.iter().map(|t| t.gain_pct).sum();
    let brokerage_pct = real.len() as f64 * brokerage_rate * 100.0 * 2.0;
    let net_profit_pct = gross_profit_pct - brokerage_pct;

    TradeSummary {
        total_trades: trades.len(),
        real_trades: real.len(),
        virtual_trades,
        max_consecutive_wins,
        max_consecutive_losses,
        real_win_trades,
        real_lose_trades,
        buy_total,
        buy_win_trades,
        buy_lose_trades,
        sell_total,
        sell_win_trades,
        sell_lose_trades,
        buy_win_pct: round1(pct(buy_win_trades, buy_total)),
        sell_win_pct: round1(pct(sell_win_trades, sell_total)),
        overall_win_pct: round1(pct(real_win_trades, real.len())),
        gross_profit_pct: round1(gross_profit_pct),
        brokerage_pct: round1(brokerage_pct),
        net_profit_pct: round1(net_profit_pct),
    }
}
