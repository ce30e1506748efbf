//! Consul KV backend over the `/v1/kv` HTTP API.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::{VolumeError, VolumeResult};
use crate::domain::ports::{KeyValueBackend, KeyValueMap};

const TOKEN_HEADER: &str = "X-Consul-Token";

/// Connection settings for [`ConsulBackend`].
#[derive(Debug, Clone)]
pub struct ConsulConfig {
    /// Base HTTP address, e.g. `http://localhost:8500`
    pub address: String,
    /// Root prefix every key is stored under
    pub data_prefix: String,
    /// ACL token
    pub token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct KvPair {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: Option<String>,
}

/// Consul-backed [`KeyValueBackend`] using a blocking HTTP client.
#[derive(Debug)]
pub struct ConsulBackend {
    client: Client,
    base: Url,
    data_prefix: String,
    token: Option<String>,
}

impl ConsulBackend {
    pub fn new(config: ConsulConfig) -> VolumeResult<Self> {
        let base = Url::parse(&config.address)
            .map_err(|e| VolumeError::Backend(format!("invalid consul address '{}': {e}", config.address)))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(VolumeError::backend)?;

        Ok(Self {
            client,
            base,
            data_prefix: config.data_prefix.trim_matches('/').to_string(),
            token: config.token,
        })
    }

    fn full_key(&self, key: &str) -> String {
        if self.data_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{key}", self.data_prefix)
        }
    }

    fn url(&self, key: &str, query: Option<&str>) -> VolumeResult<Url> {
        let full = self.full_key(key);
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| VolumeError::Backend(format!("consul address cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(["v1", "kv"])
            .extend(full.split('/'));
        url.set_query(query);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> VolumeResult<Response> {
        let request = match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        };
        request.send().map_err(VolumeError::backend)
    }

    /// GET that treats 404 as absent.
    fn get(&self, url: Url) -> VolumeResult<Option<Response>> {
        debug!(%url, "consul get");
        let response = self.send(self.client.get(url.clone()))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response)),
            status => Err(status_error("GET", &url, status)),
        }
    }

    fn decode(value: Option<&str>) -> VolumeResult<Vec<u8>> {
        match value {
            Some(encoded) => BASE64
                .decode(encoded)
                .map_err(|e| VolumeError::Backend(format!("invalid base64 value from consul: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}

fn status_error(method: &str, url: &Url, status: StatusCode) -> VolumeError {
    VolumeError::Backend(format!("consul {method} {} returned {status}", url.path()))
}

impl KeyValueBackend for ConsulBackend {
    fn get_map(&self, prefix: &str) -> VolumeResult<KeyValueMap> {
        let Some(response) = self.get(self.url(prefix, Some("recurse"))?)? else {
            return Ok(KeyValueMap::new());
        };
        let pairs: Vec<KvPair> = response.json().map_err(VolumeError::backend)?;

        let strip = self.full_key(prefix);
        let mut out = KeyValueMap::new();
        for pair in pairs {
            if pair.key.ends_with('/') && pair.value.is_none() {
                continue;
            }
            let Some(key) = pair.key.strip_prefix(strip.as_str()) else {
                continue;
            };
            out.insert(key.to_string(), Self::decode(pair.value.as_deref())?);
        }
        Ok(out)
    }

    fn set_map(&self, prefix: &str, map: &KeyValueMap) -> VolumeResult<()> {
        for (key, value) in map {
            let url = self.url(&format!("{prefix}{key}"), None)?;
            debug!(%url, bytes = value.len(), "consul put");
            let response = self.send(self.client.put(url.clone()).body(value.clone()))?;
            if !response.status().is_success() {
                return Err(status_error("PUT", &url, response.status()));
            }
        }
        Ok(())
    }

    fn delete_map(&self, prefix: &str) -> VolumeResult<()> {
        let url = self.url(prefix, Some("recurse"))?;
        debug!(%url, "consul delete");
        let response = self.send(self.client.delete(url.clone()))?;
        if !response.status().is_success() {
            return Err(status_error("DELETE", &url, response.status()));
        }
        Ok(())
    }

    fn key_exists(&self, key: &str) -> VolumeResult<bool> {
        let Some(response) = self.get(self.url(key, None)?)? else {
            return Ok(false);
        };
        let pairs: Vec<KvPair> = response.json().map_err(VolumeError::backend)?;
        Ok(pairs
            .first()
            .and_then(|pair| pair.value.as_deref())
            .is_some_and(|value| !value.is_empty()))
    }

    fn prefix_exists(&self, prefix: &str) -> VolumeResult<bool> {
        let Some(response) = self.get(self.url(prefix, Some("keys"))?)? else {
            return Ok(false);
        };
        let keys: Vec<String> = response.json().map_err(VolumeError::backend)?;
        Ok(!keys.is_empty())
    }

    fn describe(&self) -> String {
        format!("consul {} (prefix '{}')", self.base, self.data_prefix)
    }
}
