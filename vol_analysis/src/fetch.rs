/// fetch.rs — Daily closes from the Yahoo Finance v8 chart endpoint
///
///   GET {base}/v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d
///
/// Adjusted closes are used when the payload carries them, plain closes
/// otherwise. Rows with a missing price are skipped.
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

use garch_engine::{PricePoint, PriceSeries};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Parse a chart payload into a validated price series.
pub fn parse_chart(body: &str) -> Result<PriceSeries> {
    let response: ChartResponse =
        serde_json::from_str(body).context("Failed to parse Yahoo chart response")?;

    if let Some(err) = response.chart.error {
        bail!("Yahoo API error [{}]: {}", err.code, err.description);
    }
    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("Yahoo chart response has no result"))?;

    let adjusted = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .map(|a| a.adjclose)
        .filter(|a| a.iter().any(Option::is_some));
    let closes = match adjusted {
        Some(a) => a,
        None => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .ok_or_else(|| anyhow!("Yahoo chart response has no quotes"))?,
    };

    let offset = result.meta.gmtoffset;
    let mut points: Vec<PricePoint> = Vec::with_capacity(closes.len());
    let mut skipped = 0usize;
    for (&ts, close) in result.timestamp.iter().zip(&closes) {
        let Some(price) = close.filter(|p| p.is_finite() && *p > 0.0) else {
            skipped += 1;
            continue;
        };
        let date = exchange_date(ts, offset)?;
        // a trailing intraday row can repeat the last session's date
        if points.last().is_some_and(|p| p.date >= date) {
            skipped += 1;
            continue;
        }
        points.push(PricePoint { date, price });
    }
    if skipped > 0 {
        debug!(skipped, symbol = ?result.meta.symbol, "dropped rows without a usable close");
    }

    PriceSeries::new(points).context("Yahoo prices failed validation")
}

fn exchange_date(ts: i64, gmtoffset: i64) -> Result<NaiveDate> {
    DateTime::from_timestamp(ts + gmtoffset, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| anyhow!("timestamp {ts} out of range"))
}

pub struct YahooClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    retry_pause: Duration,
}

impl YahooClient {
    pub fn new(base_url: &str, user_agent: &str, max_retries: u32) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
            retry_pause: Duration::from_secs(10),
        })
    }

    pub fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let period1 = start.and_hms_opt(0, 0, 0).map(|d| d.and_utc().timestamp()).unwrap_or(0);
        let period2 = end.and_hms_opt(23, 59, 59).map(|d| d.and_utc().timestamp()).unwrap_or(0);
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url, symbol, period1, period2
        )
    }

    /// Daily prices for `symbol` between `start` and `end`, inclusive.
    pub async fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries> {
        if end < start {
            bail!("end date {end} is before start date {start}");
        }
        let url = self.chart_url(symbol, start, end);
        info!("Fetching {} daily closes {} → {}", symbol, start, end);

        let mut attempt = 0u32;
        let body = loop {
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .with_context(|| format!("GET {url}"))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    bail!("Rate limited by Yahoo after {} retries", self.max_retries);
                }
                attempt += 1;
                warn!("Rate limited (429). Sleeping {:?} before retry {}/{}", self.retry_pause, attempt, self.max_retries);
                sleep(self.retry_pause).await;
                continue;
            }
            let text = response.text().await.context("Failed to read Yahoo response body")?;
            if !status.is_success() {
                // chart errors come back as 404 with a JSON body
                if let Err(e) = parse_chart(&text) {
                    bail!("Yahoo request for {symbol} failed ({status}): {e}");
                }
                bail!("Yahoo request for {symbol} failed ({status})");
            }
            break text;
        };

        let prices = parse_chart(&body)?;
        info!(
            "Loaded {} closes ({} → {})",
            prices.len(),
            prices.first_date().map(|d| d.to_string()).unwrap_or_default(),
            prices.last_date().map(|d| d.to_string()).unwrap_or_default()
        );
        Ok(prices)
    }
}
