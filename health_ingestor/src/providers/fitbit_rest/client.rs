use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use log::debug;
use reqwest::{Client, header};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use shared_utils::env::get_env_var;
use snafu::{OptionExt, ResultExt};

use crate::{
    config::{ACCESS_TOKEN_ENV, ApiConfig},
    providers::{
        AuthenticatedClient, ClientBuildSnafu, DecodeSnafu, InvalidQuotaSnafu, InvalidTokenSnafu,
        MissingEnvVarSnafu, ProviderError, ProviderInitError, ReqwestSnafu,
    },
};

/// Bearer-token client for the Fitbit Web API.
///
/// An optional hourly quota is enforced client-side: when it is used up,
/// [`get`](AuthenticatedClient::get) waits for capacity instead of letting
/// the upstream answer with a rate-limit error. URLs are taken as given; the
/// base URL is the caller's concern.
pub struct FitbitClient {
    client: Client,
    limiter: Option<DefaultDirectRateLimiter>,
    _token: SecretString,
}

impl FitbitClient {
    /// Creates a client from an already-issued access token.
    pub fn new(config: &ApiConfig, token: SecretString) -> Result<Self, ProviderInitError> {
        let mut bearer = header::HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .context(InvalidTokenSnafu)?;
        bearer.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context(ClientBuildSnafu)?;

        let limiter = match config.requests_per_hour {
            None => None,
            Some(per_hour) => {
                let per_hour = NonZeroU32::new(per_hour).context(InvalidQuotaSnafu {
                    message: "requests_per_hour must be at least 1",
                })?;
                Some(RateLimiter::direct(Quota::per_hour(per_hour)))
            }
        };

        Ok(Self {
            client,
            limiter,
            _token: token,
        })
    }

    /// Creates a client, reading the access token from `FITBIT_ACCESS_TOKEN`.
    pub fn from_env(config: &ApiConfig) -> Result<Self, ProviderInitError> {
        let token = SecretString::new(get_env_var(ACCESS_TOKEN_ENV).context(MissingEnvVarSnafu)?.into());
        Self::new(config, token)
    }
}

#[async_trait]
impl AuthenticatedClient for FitbitClient {
    async fn get(&self, url: &str) -> Result<Value, ProviderError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let response = self.client.get(url).send().await.context(ReqwestSnafu)?;
        let status = response.status();
        debug!("GET {url} -> {status}");

        // error envelopes arrive with 4xx/429 statuses, so the body is decoded regardless
        let bytes = response.bytes().await.context(ReqwestSnafu)?;
        serde_json::from_slice(&bytes).context(DecodeSnafu {
            url,
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(requests_per_hour: Option<u32>) -> ApiConfig {
        ApiConfig {
            requests_per_hour,
            ..ApiConfig::default()
        }
    }

    #[test]
    fn builds_with_quota() {
        let client = FitbitClient::new(&api(Some(150)), SecretString::new("abc".into())).unwrap();
        assert!(client.limiter.is_some());
        let unthrottled = FitbitClient::new(&api(None), SecretString::new("abc".into())).unwrap();
        assert!(unthrottled.limiter.is_none());
    }

    #[test]
    fn rejects_zero_quota() {
        let err = FitbitClient::new(&api(Some(0)), SecretString::new("abc".into())).err().unwrap();
        assert!(matches!(err, ProviderInitError::InvalidQuota { .. }));
    }

    #[test]
    fn rejects_token_with_newline() {
        let err = FitbitClient::new(&api(None), SecretString::new("abc\ndef".into())).err().unwrap();
        assert!(matches!(err, ProviderInitError::InvalidToken { .. }));
    }
}
