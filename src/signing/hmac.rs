use crate::error::{DcaError, Result};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Binance API key pair
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub secret: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl ApiCredentials {
    pub fn new(api_key: String, secret: String) -> Self {
        Self { api_key, secret }
    }

    /// Load from BINANCE_API_KEY / BINANCE_API_SECRET
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("BINANCE_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                DcaError::Configuration("BINANCE_API_KEY environment variable required".into())
            })?;
        let secret = std::env::var("BINANCE_API_SECRET")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                DcaError::Configuration("BINANCE_API_SECRET environment variable required".into())
            })?;

        Ok(Self::new(api_key, secret))
    }
}

/// Signs query strings for USER_DATA / TRADE endpoints
#[derive(Clone, Debug)]
pub struct QuerySigner {
    credentials: ApiCredentials,
}

impl QuerySigner {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }

    /// Hex-encoded HMAC-SHA256 of the exact query string sent
    pub fn sign(&self, query: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.secret.as_bytes())
            .map_err(|e| DcaError::Signature(format!("HMAC init failed: {}", e)))?;

        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn api_key_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&self.credentials.api_key)
                .map_err(|e| DcaError::Internal(format!("Invalid API key header: {}", e)))?,
        );
        Ok(headers)
    }
}
