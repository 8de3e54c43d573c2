pub mod hmac;

pub use hmac::{ApiCredentials, QuerySigner, API_KEY_HEADER};
