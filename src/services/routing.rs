//! Per-instrument provider routing

use crate::error::SignalError;
use crate::models::indicators::Series;
use crate::services::market_data::MarketDataProvider;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Sends listed stock tickers to one provider and everything else to the
/// crypto provider
pub struct RoutingMarketDataProvider {
    crypto: Arc<dyn MarketDataProvider>,
    stocks: Arc<dyn MarketDataProvider>,
    stock_symbols: HashSet<String>,
}

impl RoutingMarketDataProvider {
    pub fn new(
        crypto: Arc<dyn MarketDataProvider>,
        stocks: Arc<dyn MarketDataProvider>,
        stock_symbols: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            crypto,
            stocks,
            stock_symbols: stock_symbols.into_iter().collect(),
        }
    }

    pub fn is_stock(&self, instrument: &str) -> bool {
        self.stock_symbols.contains(instrument)
    }

    fn route(&self, instrument: &str) -> &dyn MarketDataProvider {
        if self.is_stock(instrument) {
            self.stocks.as_ref()
        } else {
            self.crypto.as_ref()
        }
    }
}

#[async_trait]
impl MarketDataProvider for RoutingMarketDataProvider {
    async fn fetch_series(
        &self,
        instrument: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Series, SignalError> {
        self.route(instrument)
            .fetch_series(instrument, timeframe, limit)
            .await
    }
}
