//! Binance spot REST adapter.
//!
//! Public market-data calls go out unsigned; order calls carry `timestamp`,
//! `recvWindow` and an HMAC-SHA256 `signature` over the exact query string.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::domain::{ExchangeFilters, OrderStatus};
use crate::error::{DcaError, ExchangeError, Result};
use crate::exchange::{ExchangeClient, LimitOrderRequest, OrderId, PlacedOrder};
use crate::signing::QuerySigner;

pub const DEFAULT_BINANCE_API_BASE: &str = "https://api.binance.com";
pub const TESTNET_BINANCE_API_BASE: &str = "https://testnet.binance.vision";
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

#[derive(Debug, Deserialize)]
pub struct ExchangeInfoResponse {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    Price { tick_size: Option<Decimal> },
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        min_qty: Option<Decimal>,
        max_qty: Option<Decimal>,
        step_size: Option<Decimal>,
    },
    #[serde(rename = "NOTIONAL", rename_all = "camelCase")]
    Notional { min_notional: Option<Decimal> },
    #[serde(rename = "MIN_NOTIONAL", rename_all = "camelCase")]
    MinNotional { min_notional: Option<Decimal> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTickerResponse {
    pub symbol: String,
    #[serde(default)]
    pub ask_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    msg: Option<String>,
}

/// Pull the five sizing constraints out of an exchangeInfo payload.
///
/// `NOTIONAL` wins over the legacy `MIN_NOTIONAL`; absent values fall back to
/// [`ExchangeFilters`] defaults.
pub fn filters_from_exchange_info(
    symbol: &str,
    info: &ExchangeInfoResponse,
) -> std::result::Result<ExchangeFilters, ExchangeError> {
    let entry = info
        .symbols
        .iter()
        .find(|s| s.symbol == symbol)
        .ok_or_else(|| {
            ExchangeError::not_found(format!("Symbol {} not found in exchange info", symbol))
        })?;

    let mut filters = ExchangeFilters::default();
    let mut notional = None;
    let mut legacy_notional = None;

    for filter in &entry.filters {
        match filter {
            SymbolFilter::Price { tick_size } => {
                if let Some(tick) = tick_size {
                    filters.tick_size = *tick;
                }
            }
            SymbolFilter::LotSize {
                min_qty,
                max_qty,
                step_size,
            } => {
                if let Some(v) = min_qty {
                    filters.min_qty = *v;
                }
                if let Some(v) = max_qty {
                    filters.max_qty = *v;
                }
                if let Some(v) = step_size {
                    filters.step_size = *v;
                }
            }
            SymbolFilter::Notional { min_notional } => notional = *min_notional,
            SymbolFilter::MinNotional { min_notional } => legacy_notional = *min_notional,
            SymbolFilter::Other => {}
        }
    }

    if let Some(min_notional) = notional.or(legacy_notional) {
        filters.min_notional = min_notional;
    }

    Ok(filters)
}

/// Best ask from a bookTicker payload; empty or zero means no quote.
pub fn best_ask_from_ticker(
    symbol: &str,
    ticker: &BookTickerResponse,
) -> std::result::Result<Decimal, ExchangeError> {
    let no_quote = || ExchangeError::not_found(format!("No ask price found for {}", symbol));

    let raw = ticker
        .ask_price
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(no_quote)?;

    let ask = Decimal::from_str_exact(raw).map_err(|e| {
        ExchangeError::new(200, None, format!("Invalid ask price '{}': {}", raw, e))
    })?;

    if ask <= Decimal::ZERO {
        return Err(no_quote());
    }
    Ok(ask)
}

/// Build the urlencoded query for signing; parameter order is preserved
pub fn encode_query(params: &[(&str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    base_url: String,
    recv_window_ms: u64,
    signer: Option<QuerySigner>,
}

impl BinanceClient {
    pub fn new(
        base_url: Option<&str>,
        signer: Option<QuerySigner>,
        recv_window_ms: u64,
        request_timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BINANCE_API_BASE)
            .trim_end_matches('/')
            .to_string();

        let http = Client::builder()
            .user_agent(concat!("crypto-dca/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .map_err(|e| DcaError::Internal(format!("failed to build HTTP client: {}", e)))?;

        info!(
            "Binance client ready ({}, {})",
            base_url,
            if signer.is_some() { "signed" } else { "public only" }
        );

        Ok(Self {
            http,
            base_url,
            recv_window_ms,
            signer,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn signed_query(
        &self,
        params: &[(&str, String)],
    ) -> std::result::Result<(String, &QuerySigner), ExchangeError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ExchangeError::new(401, None, "API credentials required for signed endpoint")
        })?;

        let mut all: Vec<(&str, String)> = params.to_vec();
        all.push(("timestamp", Utc::now().timestamp_millis().to_string()));
        all.push(("recvWindow", self.recv_window_ms.to_string()));

        let query = encode_query(&all);
        let signature = signer
            .sign(&query)
            .map_err(|e| ExchangeError::new(0, None, e.to_string()))?;

        Ok((format!("{}&signature={}", query, signature), signer))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        signed: bool,
    ) -> std::result::Result<T, ExchangeError> {
        debug!("Request: {} {} params={:?}", method, path, params);

        let mut req = if signed {
            let (query, signer) = self.signed_query(params)?;
            let headers = signer
                .api_key_headers()
                .map_err(|e| ExchangeError::new(0, None, e.to_string()))?;
            self.http
                .request(method.clone(), format!("{}{}?{}", self.base_url, path, query))
                .headers(headers)
        } else {
            self.http
                .request(method.clone(), format!("{}{}", self.base_url, path))
                .query(params)
        };
        req = req.header(reqwest::header::ACCEPT, "application/json");

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let body: Option<ApiErrorBody> = serde_json::from_str(&text).ok();
            let (code, msg) = match body {
                Some(b) => (b.code, b.msg.unwrap_or_else(|| text.clone())),
                None => (None, text.clone()),
            };
            return Err(ExchangeError::new(status.as_u16(), code, msg));
        }

        serde_json::from_str(&text).map_err(|e| {
            ExchangeError::new(
                status.as_u16(),
                None,
                format!("Invalid JSON from {} {}: {}", method, path, e),
            )
        })
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn get_exchange_filters(
        &self,
        symbol: &str,
    ) -> std::result::Result<ExchangeFilters, ExchangeError> {
        let info: ExchangeInfoResponse = self
            .request(
                Method::GET,
                "/api/v3/exchangeInfo",
                &[("symbol", symbol.to_string())],
                false,
            )
            .await?;
        filters_from_exchange_info(symbol, &info)
    }

    async fn get_best_ask(&self, symbol: &str) -> std::result::Result<Decimal, ExchangeError> {
        let ticker: BookTickerResponse = self
            .request(
                Method::GET,
                "/api/v3/ticker/bookTicker",
                &[("symbol", symbol.to_string())],
                false,
            )
            .await?;
        best_ask_from_ticker(symbol, &ticker)
    }

    async fn place_limit_order(
        &self,
        request: &LimitOrderRequest,
    ) -> std::result::Result<PlacedOrder, ExchangeError> {
        debug!(
            "Placing {} LIMIT order: {} {} @ {} ({})",
            request.side, request.quantity, request.symbol, request.price, request.time_in_force
        );

        let params = [
            ("symbol", request.symbol.clone()),
            ("side", request.side.as_str().to_string()),
            ("type", "LIMIT".to_string()),
            ("timeInForce", request.time_in_force.as_str().to_string()),
            ("quantity", request.quantity.to_string()),
            ("price", request.price.to_string()),
        ];
        let resp: OrderResponse = self
            .request(Method::POST, "/api/v3/order", &params, true)
            .await?;

        Ok(PlacedOrder {
            order_id: resp.order_id,
            status: resp.status,
        })
    }

    async fn get_order_status(
        &self,
        symbol: &str,
        order_id: OrderId,
    ) -> std::result::Result<OrderStatus, ExchangeError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        let resp: OrderResponse = self
            .request(Method::GET, "/api/v3/order", &params, true)
            .await?;
        Ok(resp.status)
    }

    async fn cancel_order(
        &self,
        symbol: &str,
        order_id: OrderId,
    ) -> std::result::Result<OrderStatus, ExchangeError> {
        info!("Cancelling order {} for {}", order_id, symbol);
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.to_string()),
        ];
        let resp: OrderResponse = self
            .request(Method::DELETE, "/api/v3/order", &params, true)
            .await?;
        Ok(resp.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const BTCEUR_INFO: &str = r#"{
        "timezone": "UTC",
        "symbols": [{
            "symbol": "BTCEUR",
            "status": "TRADING",
            "filters": [
                {"filterType": "PRICE_FILTER", "minPrice": "0.01000000", "maxPrice": "1000000.00000000", "tickSize": "0.01000000"},
                {"filterType": "LOT_SIZE", "minQty": "0.00001000", "maxQty": "9000.00000000", "stepSize": "0.00001000"},
                {"filterType": "ICEBERG_PARTS", "limit": 10},
                {"filterType": "MIN_NOTIONAL", "minNotional": "10.00000000", "applyToMarket": true, "avgPriceMins": 5},
                {"filterType": "NOTIONAL", "minNotional": "5.00000000", "applyMinToMarket": true, "maxNotional": "9000000.00000000", "applyMaxToMarket": false, "avgPriceMins": 5}
            ]
        }]
    }"#;

    #[test]
    fn test_filters_from_exchange_info() {
        let info: ExchangeInfoResponse = serde_json::from_str(BTCEUR_INFO).unwrap();
        let filters = filters_from_exchange_info("BTCEUR", &info).unwrap();

        assert_eq!(filters.tick_size, dec!(0.01));
        assert_eq!(filters.step_size, dec!(0.00001));
        assert_eq!(filters.min_qty, dec!(0.00001));
        assert_eq!(filters.max_qty, dec!(9000));
        // NOTIONAL takes precedence over MIN_NOTIONAL
        assert_eq!(filters.min_notional, dec!(5));
    }

    #[test]
    fn test_missing_filters_use_defaults() {
        let info: ExchangeInfoResponse = serde_json::from_str(
            r#"{"symbols": [{"symbol": "ETHEUR", "filters": [
                {"filterType": "MIN_NOTIONAL", "minNotional": "7.5"}
            ]}]}"#,
        )
        .unwrap();
        let filters = filters_from_exchange_info("ETHEUR", &info).unwrap();

        assert_eq!(filters.tick_size, ExchangeFilters::DEFAULT_TICK_SIZE);
        assert_eq!(filters.step_size, ExchangeFilters::DEFAULT_STEP_SIZE);
        assert_eq!(filters.max_qty, ExchangeFilters::DEFAULT_MAX_QTY);
        assert_eq!(filters.min_notional, dec!(7.5));
    }

    #[test]
    fn test_unknown_symbol_is_not_found() {
        let info: ExchangeInfoResponse = serde_json::from_str(BTCEUR_INFO).unwrap();
        let err = filters_from_exchange_info("DOGEEUR", &info).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.message.contains("DOGEEUR"));
    }

    #[test]
    fn test_best_ask_parsing() {
        let ticker: BookTickerResponse = serde_json::from_str(
            r#"{"symbol":"BTCEUR","bidPrice":"29999.99","bidQty":"0.5","askPrice":"30000.00","askQty":"0.2"}"#,
        )
        .unwrap();
        assert_eq!(best_ask_from_ticker("BTCEUR", &ticker).unwrap(), dec!(30000.00));

        for body in [
            r#"{"symbol":"BTCEUR","askPrice":""}"#,
            r#"{"symbol":"BTCEUR","askPrice":"0.00000000"}"#,
            r#"{"symbol":"BTCEUR"}"#,
        ] {
            let ticker: BookTickerResponse = serde_json::from_str(body).unwrap();
            assert!(best_ask_from_ticker("BTCEUR", &ticker).unwrap_err().is_not_found());
        }
    }

    #[test]
    fn test_order_response_parsing() {
        let resp: OrderResponse = serde_json::from_str(
            r#"{"symbol":"BTCEUR","orderId":28,"clientOrderId":"abc","transactTime":1507725176595,
                "price":"29970.00","origQty":"0.00333","executedQty":"0.00000000",
                "status":"NEW","timeInForce":"GTC","type":"LIMIT","side":"BUY","fills":[]}"#,
        )
        .unwrap();
        assert_eq!(resp.order_id, 28);
        assert_eq!(resp.status, OrderStatus::New);
    }

    #[test]
    fn test_encode_query_preserves_order() {
        let query = encode_query(&[
            ("symbol", "BTCEUR".to_string()),
            ("side", "BUY".to_string()),
            ("quantity", "0.00333".to_string()),
        ]);
        assert_eq!(query, "symbol=BTCEUR&side=BUY&quantity=0.00333");
    }

    #[tokio::test]
    async fn test_signed_call_without_credentials_fails_fast() {
        let client = BinanceClient::new(
            Some("http://127.0.0.1:9"),
            None,
            DEFAULT_RECV_WINDOW_MS,
            Duration::from_secs(1),
        )
        .unwrap();

        let err = client.get_order_status("BTCEUR", 1).await.unwrap_err();
        assert_eq!(err.http_status, 401);
    }
}
