//! Read-through research service.
//!
//! Wires the ports together: consult the cache, fall back to fetching bars
//! and events through the ports, run the engine, then populate the cache.
//! Keys carry both user and symbol so cached reports are per-user.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::domain::backtest::BacktestConfig;
use crate::domain::engine::{self, BacktestReport, ExplainReport};
use crate::domain::error::TradesightError;
use crate::domain::signal::{TemplateId, TemplateParams};
use crate::ports::cache_port::CachePort;
use crate::ports::event_port::EventPort;
use crate::ports::price_port::PricePort;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub struct ResearchService<P, E, C> {
    prices: P,
    events: E,
    cache: C,
    ttl: Duration,
    event_types: Vec<String>,
    licenses: Vec<String>,
}

impl<P, E, C> ResearchService<P, E, C>
where
    P: PricePort,
    E: EventPort,
    C: CachePort,
{
    pub fn new(prices: P, events: E, cache: C) -> Self {
        ResearchService {
            prices,
            events,
            cache,
            ttl: DEFAULT_TTL,
            event_types: Vec::new(),
            licenses: Vec::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_event_filter(mut self, event_types: Vec<String>, licenses: Vec<String>) -> Self {
        self.event_types = event_types;
        self.licenses = licenses;
        self
    }

    pub fn explain(&self, user: &str, symbol: &str) -> Result<ExplainReport, TradesightError> {
        let key = format!("explain:{user}:{symbol}");
        if let Some(hit) = self.cache.get(&key) {
            if let Ok(report) = serde_json::from_str(&hit) {
                return Ok(report);
            }
        }

        let (bars, events) = self.fetch(symbol)?;
        let report = engine::explain_signals(&bars, &events)?;
        if let Ok(payload) = serde_json::to_string(&report) {
            self.cache.put(&key, payload, self.ttl);
        }
        Ok(report)
    }

    pub fn backtest(
        &self,
        user: &str,
        symbol: &str,
        template: TemplateId,
        params: &TemplateParams,
        config: &BacktestConfig,
    ) -> Result<BacktestReport, TradesightError> {
        // params and costs change the result, so they are part of the key
        let fingerprint = serde_json::to_string(&(params, config)).unwrap_or_default();
        let key = format!("backtest:{user}:{symbol}:{}:{fingerprint}", template.code());
        if let Some(hit) = self.cache.get(&key) {
            if let Ok(report) = serde_json::from_str(&hit) {
                return Ok(report);
            }
        }

        let (bars, events) = self.fetch(symbol)?;
        let report = engine::run_backtest(&bars, template, params, config, &events)?;
        if let Ok(payload) = serde_json::to_string(&report) {
            self.cache.put(&key, payload, self.ttl);
        }
        Ok(report)
    }

    fn fetch(
        &self,
        symbol: &str,
    ) -> Result<
        (
            Vec<crate::domain::ohlcv::PriceBar>,
            BTreeSet<chrono::NaiveDate>,
        ),
        TradesightError,
    > {
        let bars = self.prices.fetch_daily(symbol)?;
        let events = self
            .events
            .qualifying_dates(symbol, &self.event_types, &self.licenses)?;
        Ok((bars, events))
    }
}
