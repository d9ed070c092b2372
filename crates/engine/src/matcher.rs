use chrono::NaiveDateTime;

use common::{Bar, EntrySignal, Side, Trade, TradeResult};

/// Outcome of scanning a trade forward through subsequent bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeClose {
    pub time: NaiveDateTime,
    pub result: TradeResult,
    pub gain_pct: f64,
}

/// Scan bars one at a time and return the first resolution of a position,
/// or `None` if no bar in the series breaches a bracket.
///
/// Stop-loss is checked before take-profit when both are breached within
/// the same bar (conservative tie-break). Callers must pass only bars
/// strictly after the entry bar.
pub fn resolve_forward(
    side: Side,
    entry_price: f64,
    stop_loss: f64,
    take_profit: f64,
    bars: &[Bar],
) -> Option<TradeClose> {
    for bar in bars {
        match side {
            Side::Long => {
                if bar.low <= stop_loss {
                    return Some(TradeClose {
                        time: bar.time,
                        result: TradeResult::Lose,
                        gain_pct: (stop_loss - entry_price) / entry_price * 100.0,
                    });
                }
                if bar.high >= take_profit {
                    return Some(TradeClose {
                        time: bar.time,
                        result: TradeResult::Win,
                        gain_pct: (take_profit - entry_price) / entry_price * 100.0,
                    });
                }
            }
            Side::Short => {
                if bar.high >= stop_loss {
                    return Some(TradeClose {
                        time: bar.time,
                        result: TradeResult::Lose,
                        gain_pct: (entry_price - stop_loss) / entry_price * 100.0,
                    });
                }
                if bar.low <= take_profit {
                    return Some(TradeClose {
                        time: bar.time,
                        result: TradeResult::Win,
                        gain_pct: (entry_price - take_profit) / entry_price * 100.0,
                    });
                }
            }
        }
    }
    None
}

/// Which trade window, if any, currently blocks new entries.
#[derive(Debug, Clone, Copy)]
enum OpenState {
    Free,
    /// A trade ran from its entry through this close time; signals inside
    /// that window (close bar included) are discarded.
    ClosedAt(NaiveDateTime),
    /// A trade never resolved within the batch; everything after it is
    /// blocked.
    Pending,
}

/// Convert entry signals plus the bar series into resolved/pending trades.
///
/// Signals are processed chronologically; while a trade is open every
/// further signal is discarded, which enforces at most one open trade per
/// instrument. At most the final trade may be pending.
pub fn match_trades(instrument: &str, bars: &[Bar], signals: &[EntrySignal]) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut state = OpenState::Free;

    for signal in signals {
        match state {
            OpenState::Pending => break,
            OpenState::ClosedAt(close_time) if signal.time <= close_time => continue,
            _ => {}
        }

        let mut trade = Trade::open(instrument, signal);
        let first_after = bars.partition_point(|b| b.time <= signal.time);
        match resolve_forward(
            signal.side,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
            &bars[first_after..],
        ) {
            Some(close) => {
                trade.close_time = Some(close.time);
                trade.result = Some(close.result);
                trade.gain_pct = close.gain_pct;
                state = OpenState::ClosedAt(close.time);
            }
            None => {
                state = OpenState::Pending;
            }
        }
        trades.push(trade);
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(minute: u32) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(
            &format!("2024-01-01 00:{minute:02}:00"),
            "%Y-%m-%d %H:%M:%S",
        )
        .unwrap()
    }

    fn bar(minute: u32, low: f64, high: f64) -> Bar {
        Bar {
            time: time(minute),
            open: (low + high) / 2.0,
            high,
            low,
            close: (low + high) / 2.0,
            volume: 1.0,
        }
    }

    fn long_signal(minute: u32) -> EntrySignal {
        EntrySignal {
            time: time(minute),
            side: Side::Long,
            entry_price: 100.0,
            stop_loss: 99.0,
            take_profit: 103.0,
        }
    }

    #[test]
    fn stop_loss_wins_the_same_bar_tie_break() {
        // Both brackets breached on the same bar: must resolve Lose.
        let bars = vec![bar(0, 100.0, 100.0), bar(1, 98.0, 104.0)];
        let trades = match_trades("BTCUSDT", &bars, &[long_signal(0)]);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].result, Some(TradeResult::Lose));
        assert!((trades[0].gain_pct + 1.0).abs() < 1e-9);
        assert_eq!(trades[0].close_time, Some(time(1)));
    }

    #[test]
    fn long_take_profit_resolves_win() {
        let bars = vec![
            bar(0, 100.0, 100.0),
            bar(1, 99.5, 102.0),
            bar(2, 101.0, 103.5),
        ];
        let trades = match_trades("BTCUSDT", &bars, &[long_signal(0)]);
        assert_eq!(trades[0].result, Some(TradeResult::Win));
        assert!((trades[0].gain_pct - 3.0).abs() < 1e-9);
        assert_eq!(trades[0].close_time, Some(time(2)));
    }

    #[test]
    fn short_brackets_mirror() {
        let signal = EntrySignal {
            time: time(0),
            side: Side::Short,
            entry_price: 100.0,
            stop_loss: 101.0,
            take_profit: 97.0,
        };
        let bars = vec![bar(0, 100.0, 100.0), bar(1, 96.5, 100.5)];
        let trades = match_trades("BTCUSDT", &bars, &[signal]);
        assert_eq!(trades[0].result, Some(TradeResult::Win));
        assert!((trades[0].gain_pct - 3.0).abs() < 1e-9);
    }

    #[test]
    fn entry_bar_itself_is_not_scanned() {
        // The signal bar breaches the stop, but resolution may only come
        // from strictly later bars.
        let bars = vec![bar(0, 98.0, 104.0), bar(1, 100.0, 101.0)];
        let trades = match_trades("BTCUSDT", &bars, &[long_signal(0)]);
        assert!(trades[0].is_pending());
    }

    #[test]
    fn unresolved_trade_stays_pending_and_blocks_later_signals() {
        let bars: Vec<Bar> = (0..5).map(|i| bar(i, 100.0, 101.0)).collect();
        let trades = match_trades("BTCUSDT", &bars, &[long_signal(0), long_signal(3)]);
        assert_eq!(trades.len(), 1, "pending trade blocks all later signals");
        assert!(trades[0].is_pending());
        assert_eq!(trades[0].result, None);
        assert_eq!(trades[0].gain_pct, 0.0);
    }

    #[test]
    fn signal_inside_open_window_is_discarded() {
        // First trade runs from bar 0 and closes on bar 3 (stop breach);
        // the signal on bar 2 must not open a second trade.
        let bars = vec![
            bar(0, 100.0, 100.5),
            bar(1, 99.5, 100.5),
            bar(2, 99.5, 100.5),
            bar(3, 98.5, 100.5),
            bar(4, 100.0, 100.5),
        ];
        let trades = match_trades("BTCUSDT", &bars, &[long_signal(0), long_signal(2)]);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].start_time, time(0));
    }

    #[test]
    fn signal_on_the_closing_bar_is_discarded() {
        let bars = vec![
            bar(0, 100.0, 100.5),
            bar(1, 98.5, 100.5),
            bar(2, 100.0, 100.5),
        ];
        let trades = match_trades("BTCUSDT", &bars, &[long_signal(0), long_signal(1)]);
        assert_eq!(trades.len(), 1);
    }

    #[test]
    fn signal_after_close_opens_a_new_trade() {
        let bars = vec![
            bar(0, 100.0, 100.5),
            bar(1, 98.5, 100.5),
            bar(2, 100.0, 100.5),
            bar(3, 99.5, 103.5),
        ];
        let trades = match_trades("BTCUSDT", &bars, &[long_signal(0), long_signal(2)]);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].result, Some(TradeResult::Lose));
        assert_eq!(trades[1].result, Some(TradeResult::Win));
        // No overlap: second trade starts after the first closed.
        assert!(trades[1].start_time > trades[0].close_time.unwrap());
    }
}
