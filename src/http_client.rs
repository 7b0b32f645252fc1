// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::ScannerConfig;
use crate::rate_limiter::{RateLimiterConfig, TargetRateLimiter, ThrottleClock};

const DEFAULT_USER_AGENT: &str = concat!("vector-suite/", env!("CARGO_PKG_VERSION"));

/// Maximum response body size (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    pub user_agent: Option<String>,
    pub accept_invalid_certs: bool,
    pub max_body_size: usize,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 1,
            user_agent: None,
            accept_invalid_certs: false,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

/// Request body plus its content type
struct Payload {
    content_type: &'static str,
    bytes: Vec<u8>,
}

/// Shared outbound client used by every probe
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    options: HttpClientOptions,
    rate_limiter: Option<Arc<TargetRateLimiter>>,
    throttle: Option<ThrottleClock>,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self> {
        Self::with_options(HttpClientOptions {
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            ..Default::default()
        })
    }

    pub fn with_options(options: HttpClientOptions) -> Result<Self> {
        let user_agent = options
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent)
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            options,
            rate_limiter: None,
            throttle: None,
        })
    }

    /// Client configured from scanner settings, rate limited when enabled
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        let client = Self::with_options(HttpClientOptions {
            timeout: config.request_timeout(),
            max_retries: config.max_retries,
            user_agent: config.user_agent.clone(),
            accept_invalid_certs: false,
            max_body_size: config.max_response_body_bytes,
        })?;

        if config.rate_limit_enabled {
            let limiter = TargetRateLimiter::new(RateLimiterConfig::per_minute(
                config.rate_limit_requests_per_minute,
            ));
            Ok(client.with_rate_limiter(Arc::new(limiter)))
        } else {
            Ok(client)
        }
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<TargetRateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Copy sharing the connection pool whose limiter waits are charged to `clock`
    pub fn with_throttle_clock(&self, clock: ThrottleClock) -> Self {
        Self {
            throttle: Some(clock),
            ..self.clone()
        }
    }

    /// Same settings and limiter, but certificate validation disabled
    pub fn insecure(&self) -> Result<Self> {
        let options = HttpClientOptions {
            accept_invalid_certs: true,
            ..self.options.clone()
        };
        let mut client = Self::with_options(options)?;
        client.rate_limiter = self.rate_limiter.clone();
        client.throttle = self.throttle.clone();
        Ok(client)
    }

    pub fn timeout(&self) -> Duration {
        self.options.timeout
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.execute(Method::GET, url, None).await
    }

    pub async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        let bytes = serde_json::to_vec(body).context("Failed to encode JSON body")?;
        self.execute(
            Method::POST,
            url,
            Some(Payload {
                content_type: "application/json",
                bytes,
            }),
        )
        .await
    }

    pub async fn post_form(&self, url: &str, body: &str) -> Result<HttpResponse> {
        self.post_with_content_type(url, body.as_bytes(), "application/x-www-form-urlencoded")
            .await
    }

    pub async fn post_with_content_type(
        &self,
        url: &str,
        body: &[u8],
        content_type: &'static str,
    ) -> Result<HttpResponse> {
        self.execute(
            Method::POST,
            url,
            Some(Payload {
                content_type,
                bytes: body.to_vec(),
            }),
        )
        .await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<Payload>,
    ) -> Result<HttpResponse> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts <= self.options.max_retries {
            if let Some(limiter) = &self.rate_limiter {
                let _throttled = self.throttle.as_ref().map(ThrottleClock::enter);
                limiter.wait_for_slot(url).await;
            }

            let mut request = self.client.request(method.clone(), url);
            if let Some(payload) = &payload {
                request = request
                    .header("Content-Type", payload.content_type)
                    .body(payload.bytes.clone());
            }

            let started = Instant::now();
            match request.send().await {
                Ok(response) => {
                    let status_code = response.status().as_u16();

                    if let Some(limiter) = &self.rate_limiter {
                        if (status_code == 429 || status_code == 503)
                            && attempts < self.options.max_retries
                        {
                            let _throttled = self.throttle.as_ref().map(ThrottleClock::enter);
                            limiter.record_rate_limit(url, status_code).await;
                            attempts += 1;
                            continue;
                        }
                    }

                    return self.read_response(response, started).await;
                }
                Err(e) => {
                    debug!("{} {} failed (attempt {}): {}", method, url, attempts + 1, e);
                    last_error = Some(e);
                    attempts += 1;
                    if attempts <= self.options.max_retries {
                        tokio::time::sleep(Duration::from_millis(100 * attempts as u64)).await;
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(e.into()),
            None => Err(anyhow::anyhow!("No attempt made for {}", url)),
        }
    }

    async fn read_response(
        &self,
        mut response: reqwest::Response,
        started: Instant,
    ) -> Result<HttpResponse> {
        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();

        let mut headers = HashMap::with_capacity(response.headers().len());
        for (k, v) in response.headers() {
            if let Ok(value) = v.to_str() {
                headers
                    .entry(k.as_str().to_string())
                    .and_modify(|existing: &mut String| {
                        existing.push_str(", ");
                        existing.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
            }
        }

        // Stop reading once the cap is reached; the rest is discarded
        let mut body_bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let remaining = self.options.max_body_size.saturating_sub(body_bytes.len());
            if chunk.len() >= remaining {
                body_bytes.extend_from_slice(&chunk[..remaining]);
                break;
            }
            body_bytes.extend_from_slice(&chunk);
        }

        Ok(HttpResponse {
            status_code,
            body: String::from_utf8_lossy(&body_bytes).into_owned(),
            headers,
            final_url,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    /// URL after redirects
    pub final_url: String,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.body.contains(pattern)
    }

    pub fn contains_ignore_case(&self, pattern: &str) -> bool {
        self.body.to_lowercase().contains(&pattern.to_lowercase())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }
}
