//! Shared HTTP client wrapper
//!
//! Thin wrapper around `reqwest::blocking::Client` that centralizes
//! USER_AGENT and timeout configuration.

use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Shared HTTP client with standard configuration
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Create a new client with default Respira settings
    pub fn new() -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { inner })
    }

    /// GET a URL and deserialize the JSON response
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.inner.get(url).send()?;
        if !resp.status().is_success() {
            return Err(AppError::NotFound(format!(
                "{} returned {}",
                url,
                resp.status()
            )));
        }
        let data = resp.json::<T>()?;
        Ok(data)
    }

    /// GET a URL and return the raw body bytes
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.inner.get(url).send()?;
        if !resp.status().is_success() {
            return Err(AppError::NotFound(format!(
                "{} returned {}",
                url,
                resp.status()
            )));
        }
        Ok(resp.bytes()?.to_vec())
    }

    /// POST a JSON body and deserialize the JSON response.
    ///
    /// Non-2xx responses are still decoded — the auth endpoints answer
    /// denials with a JSON body and an error status.
    pub fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        let resp = self.inner.post(url).json(body).send()?;
        let data = resp.json::<T>()?;
        Ok(data)
    }

    /// Access the underlying reqwest client
    pub fn inner(&self) -> &reqwest::blocking::Client {
        &self.inner
    }
}
