use common::{Trade, TradeResult};

/// Per-trade virtual classification, aligned with the input sequence.
/// `None` for pending trades: they are not classified and do not advance
/// the state machine.
///
/// The machine starts Real with a zero loss counter. In Real state every
/// trade is classified not-virtual; a loss increments the counter and the
/// second consecutive loss switches to Virtual. In Virtual state every
/// trade is classified virtual; a virtual win switches back to Real but
/// the loss counter keeps its pre-virtual value — only a *real* win resets
/// it. That asymmetry is intentional and must not be "fixed": one real
/// loss straight after a virtual recovery re-enters Virtual mode.
pub fn classify(trades: &[Trade], max_consecutive_losses: u32) -> Vec<Option<bool>> {
    classify_with_mode(trades, max_consecutive_losses).0
}

/// Classification plus whether the machine ends in Virtual mode.
///
/// The final mode says what a trade opened right now would be: a trailing
/// pending trade is real exactly when the machine is in Real mode after
/// the last classified result.
pub fn classify_with_mode(
    trades: &[Trade],
    max_consecutive_losses: u32,
) -> (Vec<Option<bool>>, bool) {
    let mut out = Vec::with_capacity(trades.len());
    let mut virtual_mode = false;
    let mut loss_counter: u32 = 0;

    for trade in trades {
        let result = match trade.result {
            Some(r) => r,
            None => {
                out.push(None);
                continue;
            }
        };

        if virtual_mode {
            out.push(Some(true));
            if result == TradeResult::Win {
                virtual_mode = false;
            }
        } else {
            out.push(Some(false));
            match result {
                TradeResult::Lose => {
                    loss_counter += 1;
                    if loss_counter >= max_consecutive_losses {
                        virtual_mode = true;
                    }
                }
                TradeResult::Win => loss_counter = 0,
            }
        }
    }

    (out, virtual_mode)
}

/// The not-virtual subsequence of a trade history, in order.
pub fn real_trades<'a>(trades: &'a [Trade], max_consecutive_losses: u32) -> Vec<&'a Trade> {
    classify(trades, max_consecutive_losses)
        .iter()
        .zip(trades)
        .filter(|(is_virtual, _)| **is_virtual == Some(false))
        .map(|(_, trade)| trade)
        .collect()
}
