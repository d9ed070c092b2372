use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use common::{Bar, Error, PriceFeed, Result};

/// Kline client for the Binance USD-M futures REST API.
///
/// Only the public market-data endpoint is used; order placement belongs
/// to the external order gateway.
pub struct BinanceFeed {
    base_url: String,
    http: Client,
}

impl BinanceFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    fn parse_klines(body: &str) -> Result<Vec<Bar>> {
        let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(body)?;
        rows.iter().map(|row| parse_kline_row(row)).collect()
    }
}

/// One kline row: `[openTime, open, high, low, close, volume, ...]` with
/// prices and volume as strings. Trailing fields are ignored.
fn parse_kline_row(row: &[serde_json::Value]) -> Result<Bar> {
    if row.len() < 6 {
        return Err(Error::Feed(format!("kline row too short: {} fields", row.len())));
    }

    let ms = row[0]
        .as_i64()
        .ok_or_else(|| Error::Feed("kline open time is not an integer".into()))?;
    let time = chrono::DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::Feed(format!("kline open time out of range: {ms}")))?
        .naive_utc();

    let field = |idx: usize, name: &str| -> Result<f64> {
        row[idx]
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| row[idx].as_f64())
            .ok_or_else(|| Error::Feed(format!("kline {name} is not numeric")))
    };

    Ok(Bar {
        time,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    async fn fetch_bars(&self, instrument: &str, interval: &str, limit: u32) -> Result<Vec<Bar>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url, instrument, interval, limit
        );
        debug!(instrument, interval, limit, "Fetching klines");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Feed(format!("HTTP {status}: {body}")));
        }

        Self::parse_klines(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kline_rows() {
        let body = r#"[
            [1704067200000, "100.0", "101.5", "99.5", "100.5", "12.3", 1704067259999, "0", 0, "0", "0", "0"],
            [1704067260000, "100.5", "102.0", "100.0", "101.0", "8.0", 1704067319999, "0", 0, "0", "0", "0"]
        ]"#;
        let bars = BinanceFeed::parse_klines(body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].time.to_string(), "2024-01-01 00:00:00");
        assert!((bars[0].high - 101.5).abs() < 1e-9);
        assert!((bars[1].volume - 8.0).abs() < 1e-9);
        assert!(bars[0].time < bars[1].time);
    }

    #[test]
    fn short_row_is_a_feed_error() {
        let body = r#"[[1704067200000, "100.0"]]"#;
        let err = BinanceFeed::parse_klines(body).unwrap_err();
        assert!(matches!(err, Error::Feed(_)));
    }

    #[test]
    fn non_numeric_price_is_a_feed_error() {
        let body = r#"[[1704067200000, "abc", "1", "1", "1", "1"]]"#;
        let err = BinanceFeed::parse_klines(body).unwrap_err();
        assert!(matches!(err, Error::Feed(_)));
    }
}
