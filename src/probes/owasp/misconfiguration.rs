// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Security Misconfiguration Probe
 * Default credentials, browsable directories, banner headers, debug mode
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde_json::json;

use crate::errors::ProbeResult;
use crate::http_client::HttpResponse;
use crate::probes::{attempt, first_indicator, FindingCollector, Probe, ProbeContext};
use crate::types::{Finding, Severity};

const DEFAULT_CREDENTIALS: &[(&str, &str)] = &[
    ("admin", "admin"),
    ("admin", "password"),
    ("root", "root"),
    ("administrator", "administrator"),
];

const EXPOSED_DIRECTORIES: &[&str] = &[
    "/.git/", "/.svn/", "/backup/", "/admin/", "/config/", "/logs/", "/tmp/",
];

/// Bodies shorter than this are treated as stub pages
const MIN_LISTING_BYTES: usize = 100;

const BANNER_HEADERS: &[&str] = &["Server", "X-Powered-By", "X-AspNet-Version"];

const DEBUG_ENDPOINTS: &[&str] = &["/debug", "/api/debug", "/admin/debug", "/test"];
const DEBUG_MARKERS: &[&str] = &["debug", "development", "test mode", "stack trace"];

pub struct SecurityMisconfigurationProbe {
    ctx: ProbeContext,
}

impl SecurityMisconfigurationProbe {
    pub const NAME: &'static str = "owasp_security_misconfiguration";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    async fn default_credentials(&self, found: &mut FindingCollector) {
        let url = self.ctx.url("/api/login");
        for (username, password) in DEFAULT_CREDENTIALS {
            let body = json!({ "username": username, "password": password });
            let accepted = attempt("default_credentials", self.ctx.http.post_json(&url, &body))
                .await
                .is_some_and(|r| r.status_code == 200);

            if accepted {
                found.push(
                    "default_credentials",
                    Severity::Critical,
                    format!("Default credentials accepted: {}/{}", username, password),
                    json!({ "credentials": { "username": username, "password": password } }),
                );
                return;
            }
        }
    }

    async fn exposed_directories(&self, found: &mut FindingCollector) {
        for directory in EXPOSED_DIRECTORIES {
            let url = self.ctx.url(directory);
            let Some(response) = attempt("exposed_directory", self.ctx.http.get(&url)).await else {
                continue;
            };

            if response.status_code == 200 && response.body.len() > MIN_LISTING_BYTES {
                found.push(
                    "exposed_directory",
                    Severity::Medium,
                    format!("Exposed directory found: {}", directory),
                    json!({ "directory": directory, "response_status": response.status_code }),
                );
                return;
            }
        }
    }

    fn server_banner(&self, landing: &HttpResponse, found: &mut FindingCollector) {
        let disclosed = BANNER_HEADERS
            .iter()
            .find_map(|name| landing.header(name).map(|value| (*name, value)));

        if let Some((header, value)) = disclosed {
            found.push(
                "server_info_disclosure",
                Severity::Low,
                format!("Server information disclosed in {} header", header),
                json!({ "header": header, "value": value }),
            );
        }
    }

    async fn debug_mode(&self, found: &mut FindingCollector) {
        for endpoint in DEBUG_ENDPOINTS {
            let url = self.ctx.url(endpoint);
            let Some(response) = attempt("debug_mode", self.ctx.http.get(&url)).await else {
                continue;
            };
            // Error pages often echo the requested path
            if response.status_code != 200 {
                continue;
            }

            if let Some(marker) = first_indicator(&response.body, DEBUG_MARKERS) {
                found.push(
                    "debug_mode",
                    Severity::Medium,
                    format!("Debug mode enabled at {}", endpoint),
                    json!({
                        "endpoint": endpoint,
                        "marker": marker,
                        "response_status": response.status_code,
                    }),
                );
                return;
            }
        }
    }
}

#[async_trait::async_trait]
impl Probe for SecurityMisconfigurationProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        let landing = self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        self.default_credentials(&mut found).await;
        self.exposed_directories(&mut found).await;
        self.server_banner(&landing, &mut found);
        self.debug_mode(&mut found).await;

        Ok(found.finish())
    }
}
