use async_trait::async_trait;
use broker::{BrokerGateway, HttpVendorTransport};
use domain::{AccountContext, Candle, ExecutionResult, Instrument, Orderbook, TradeAction, Ticker};
use pipeline::{BrokerClient, OrderRequest};

/// Adapts one account's `BrokerGateway` onto the vendor-agnostic
/// `pipeline::BrokerClient` seam. The gateway already handles caching,
/// rate limiting, the token lifecycle, and retry (C5); this layer only
/// maps pipeline-level calls onto vendor API ids and cache-key prefixes,
/// and decodes the raw vendor JSON into domain types.
pub struct BrokerAdapter {
    gateway: std::sync::Arc<BrokerGateway<HttpVendorTransport>>,
}

impl BrokerAdapter {
    pub fn new(gateway: std::sync::Arc<BrokerGateway<HttpVendorTransport>>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl BrokerClient for BrokerAdapter {
    async fn candles(&self, instrument: &Instrument, lookback: usize) -> anyhow::Result<Vec<Candle>> {
        let code = instrument.venue_code();
        let request = broker::VendorRequest::get("get_candles", "/candles")
            .with_query("symbol", code)
            .with_query("lookback", lookback.to_string());
        let value = self
            .gateway
            .execute(request, Some(format!("candles:daily:{code}")), false)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn ticker(&self, instrument: &Instrument) -> anyhow::Result<Ticker> {
        let code = instrument.venue_code();
        let request = broker::VendorRequest::get("get_ticker", "/ticker").with_query("symbol", code);
        let value = self.gateway.execute(request, Some(format!("price:{code}")), false).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn orderbook(&self, instrument: &Instrument) -> anyhow::Result<Orderbook> {
        let code = instrument.venue_code();
        let request = broker::VendorRequest::get("get_orderbook", "/orderbook").with_query("symbol", code);
        let value = self.gateway.execute(request, Some(format!("orderbook:{code}")), false).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn account(&self) -> anyhow::Result<AccountContext> {
        let request = broker::VendorRequest::get("get_account", "/account");
        let value = self.gateway.execute(request, Some("account:balance:self".to_string()), false).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn submit_order(&self, order: &OrderRequest) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "symbol": order.instrument.venue_code(),
            "side": match order.action {
                TradeAction::Buy => "BUY",
                TradeAction::Sell => "SELL",
                TradeAction::Hold => anyhow::bail!("cannot submit a HOLD order"),
            },
            "quantity": order.quantity,
            "limit_price": order.limit_price,
            "stop_loss": order.stop_loss,
            "take_profit": order.take_profit,
            "client_order_id": order.client_order_id,
        });
        let request = broker::VendorRequest::post("submit_order", "/orders", body);
        let value = self.gateway.execute(request, None, true).await?;
        let order_id = value
            .get("order_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("vendor order response missing order_id"))?;
        Ok(order_id.to_string())
    }

    async fn order_status(&self, order_id: &str) -> anyhow::Result<ExecutionResult> {
        let request = broker::VendorRequest::get("get_order_status", "/orders/status").with_query("order_id", order_id);
        let value = self.gateway.execute(request, None, false).await?;
        Ok(serde_json::from_value(value)?)
    }
}
