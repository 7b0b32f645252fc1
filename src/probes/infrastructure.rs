// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Infrastructure Probes
 * Exposed services, transport security, DNS resolution and mail hygiene
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use futures::stream::{self, StreamExt};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use serde_json::json;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};
use url::Url;

use crate::errors::{ProbeError, ProbeResult};
use crate::http_client::HttpResponse;
use crate::probes::{attempt, FindingCollector, Probe, ProbeContext};
use crate::registry::ProbeDescriptor;
use crate::types::{Finding, ProbeCategory, Severity};

const COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 143, 443, 993, 995, 3389, 5432, 3306,
];

/// Expected on any web target
const WEB_PORTS: &[u16] = &[80, 443];

const PORT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const PORT_SCAN_CONCURRENCY: usize = 8;

const MAIL_ENDPOINTS: &[&str] = &[
    "/api/email/send",
    "/api/contact",
    "/api/newsletter",
    "/api/feedback",
    "/mail",
    "/contact",
];

const MAIL_HEADER_PAYLOADS: &[&str] = &[
    "test@example.com\nBcc: attacker@evil.com",
    "test@example.com%0ABcc: attacker@evil.com",
    "test@example.com\r\nBcc: attacker@evil.com",
];

fn service_name(port: u16) -> &'static str {
    match port {
        21 => "ftp",
        22 => "ssh",
        23 => "telnet",
        25 => "smtp",
        53 => "dns",
        110 => "pop3",
        143 => "imap",
        993 => "imaps",
        995 => "pop3s",
        3306 => "mysql",
        3389 => "rdp",
        5432 => "postgresql",
        80 => "http",
        443 => "https",
        _ => "unknown",
    }
}

/// Host names worth querying DNS for; IP literals and localhost are skipped
fn resolvable_name(host: &str) -> Option<&str> {
    if host.parse::<IpAddr>().is_ok() || host.eq_ignore_ascii_case("localhost") {
        None
    } else {
        Some(host.trim_end_matches('.'))
    }
}

fn build_resolver(host: &str) -> ProbeResult<TokioResolver> {
    Ok(TokioResolver::builder(TokioConnectionProvider::default())
        .map_err(|e| ProbeError::Dns {
            host: host.to_string(),
            reason: e.to_string(),
        })?
        .build())
}

async fn txt_records(resolver: &TokioResolver, name: &str) -> Vec<String> {
    match resolver.txt_lookup(name).await {
        Ok(response) => response
            .iter()
            .map(|txt| {
                txt.iter()
                    .map(|data| String::from_utf8_lossy(data).to_string())
                    .collect::<String>()
            })
            .collect(),
        Err(e) => {
            debug!("TXT lookup for {} failed: {}", name, e);
            Vec::new()
        }
    }
}

pub struct NetworkSecurityProbe {
    ctx: ProbeContext,
}

impl NetworkSecurityProbe {
    pub const NAME: &'static str = "infra_network_security";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    async fn is_open(host: &str, port: u16, connect_timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(connect_timeout, TcpStream::connect((host, port))).await,
            Ok(Ok(_))
        )
    }
}

#[async_trait::async_trait]
impl Probe for NetworkSecurityProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);
        let Some(host) = self.ctx.host() else {
            return Ok(found.finish());
        };

        let candidates: Vec<u16> = COMMON_PORTS
            .iter()
            .copied()
            .filter(|port| !WEB_PORTS.contains(port))
            .collect();

        let connect_timeout = PORT_CONNECT_TIMEOUT.min(self.ctx.timeout);
        let open_ports: Vec<u16> = stream::iter(candidates)
            .map(|port| {
                let host = host.clone();
                async move { (port, Self::is_open(&host, port, connect_timeout).await) }
            })
            .buffered(PORT_SCAN_CONCURRENCY)
            .filter_map(|(port, open)| async move { open.then_some(port) })
            .collect()
            .await;

        for port in open_ports {
            info!("Open service port {} on {}", port, host);
            found.push(
                "port_scan",
                Severity::Medium,
                format!("Open port detected: {} ({})", port, service_name(port)),
                json!({
                    "host": host,
                    "port": port,
                    "service": service_name(port),
                }),
            );
        }

        Ok(found.finish())
    }
}

pub struct TlsSecurityProbe {
    ctx: ProbeContext,
}

impl TlsSecurityProbe {
    pub const NAME: &'static str = "infra_ssl_tls_security";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }
}

#[async_trait::async_trait]
impl Probe for TlsSecurityProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        let scheme = Url::parse(&self.ctx.target)
            .map(|u| u.scheme().to_string())
            .map_err(|e| ProbeError::Other(format!("Invalid target URL: {}", e)))?;

        if scheme == "http" {
            let response = self.ctx.baseline().await?;
            // A redirect to https is the expected fix for a plain http entry point
            if !response.final_url.starts_with("https://") {
                found.push(
                    "ssl_tls",
                    Severity::Medium,
                    "Target is not served over TLS",
                    json!({
                        "scheme": scheme,
                        "final_url": response.final_url,
                    }),
                );
            }
            return Ok(found.finish());
        }

        // The verifying baseline may fail on a bad certificate, so reachability is
        // decided by the non-verifying client.
        let verified = self.ctx.http.get(&self.ctx.target).await;
        if let Err(verify_err) = verified {
            let insecure = self.ctx.http.insecure().map_err(ProbeError::from)?;
            let response = insecure.get(&self.ctx.target).await.map_err(ProbeError::from)?;

            info!("Certificate for {} rejected by verifying client", self.ctx.target);
            untrusted_certificate(&mut found, &verify_err, &response);
        }

        Ok(found.finish())
    }
}

/// The verifying client refused the certificate but the relaxed one got an answer
fn untrusted_certificate(
    found: &mut FindingCollector,
    verify_err: &anyhow::Error,
    relaxed: &HttpResponse,
) {
    found.push(
        "ssl_tls",
        Severity::Medium,
        "Invalid or untrusted TLS certificate",
        json!({
            "verification_error": format!("{:#}", verify_err),
            "response_status": relaxed.status_code,
        }),
    );
}

pub struct DnsSecurityProbe {
    ctx: ProbeContext,
}

impl DnsSecurityProbe {
    pub const NAME: &'static str = "infra_dns_security";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    /// Distinct addresses for `name`, or why they could not be had
    async fn resolve(&self, name: &str) -> Result<BTreeSet<String>, String> {
        let resolver = build_resolver(name).map_err(|e| e.to_string())?;
        match tokio::time::timeout(self.ctx.timeout, resolver.lookup_ip(name)).await {
            Ok(Ok(lookup)) => Ok(lookup.iter().map(|ip| ip.to_string()).collect()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("lookup timed out after {:?}", self.ctx.timeout)),
        }
    }
}

#[async_trait::async_trait]
impl Probe for DnsSecurityProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        // No HTTP baseline: an unresolvable host is itself the finding
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        let Some(host) = self.ctx.host() else {
            return Ok(found.finish());
        };
        let Some(name) = resolvable_name(&host) else {
            debug!("Skipping DNS checks for {}", host);
            return Ok(found.finish());
        };

        match self.resolve(name).await {
            Ok(addresses) => {
                if addresses.len() > 1 {
                    found.push(
                        "dns_resolution",
                        Severity::Low,
                        format!("Multiple IP addresses resolved for {}", name),
                        json!({
                            "hostname": name,
                            "ip_addresses": addresses,
                        }),
                    );
                }
            }
            Err(reason) => {
                found.push(
                    "dns_resolution",
                    Severity::Medium,
                    format!("DNS resolution failed for {}: {}", name, reason),
                    json!({
                        "hostname": name,
                        "error": reason,
                    }),
                );
            }
        }

        Ok(found.finish())
    }
}

pub struct EmailSecurityProbe {
    ctx: ProbeContext,
}

impl EmailSecurityProbe {
    pub const NAME: &'static str = "infra_email_security";

    pub fn new(ctx: ProbeContext) -> Self {
        Self { ctx }
    }

    async fn check_header_injection(&self, found: &mut FindingCollector) {
        for endpoint in MAIL_ENDPOINTS {
            let url = self.ctx.url(endpoint);
            for payload in MAIL_HEADER_PAYLOADS {
                let body = json!({ "email": payload, "message": "test" });
                let Some(response) = attempt("email_injection", self.ctx.http.post_json(&url, &body)).await
                else {
                    continue;
                };

                if response.contains_ignore_case("bcc") || response.contains_ignore_case("attacker@evil.com") {
                    found.push(
                        "email_injection",
                        Severity::High,
                        format!("Email header injection at {}", endpoint),
                        json!({
                            "endpoint": endpoint,
                            "payload": payload,
                            "response_status": response.status_code,
                        }),
                    );
                    break;
                }
            }
        }
    }

    async fn check_mail_policy(&self, found: &mut FindingCollector) -> ProbeResult<()> {
        let Some(host) = self.ctx.host() else {
            return Ok(());
        };
        let Some(domain) = resolvable_name(&host) else {
            return Ok(());
        };
        let resolver = build_resolver(domain)?;

        let spf = txt_records(&resolver, domain).await;
        if !spf.iter().any(|r| r.to_lowercase().starts_with("v=spf1")) {
            found.push(
                "email_policy",
                Severity::Low,
                format!("No SPF record published for {}", domain),
                json!({ "domain": domain, "record": "spf" }),
            );
        }

        let dmarc_name = format!("_dmarc.{}", domain);
        let dmarc = txt_records(&resolver, &dmarc_name).await;
        if !dmarc.iter().any(|r| r.to_lowercase().starts_with("v=dmarc1")) {
            found.push(
                "email_policy",
                Severity::Low,
                format!("No DMARC record published for {}", domain),
                json!({ "domain": domain, "record": "dmarc" }),
            );
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Probe for EmailSecurityProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(&self) -> ProbeResult<Vec<Finding>> {
        self.ctx.baseline().await?;
        let mut found = FindingCollector::new(&self.ctx, Self::NAME);

        self.check_header_injection(&mut found).await;
        self.check_mail_policy(&mut found).await?;

        Ok(found.finish())
    }
}

pub fn descriptors() -> Vec<ProbeDescriptor> {
    vec![
        ProbeDescriptor::new(
            NetworkSecurityProbe::NAME,
            "Network Security",
            ProbeCategory::Infrastructure,
            "Reachable non-web service ports on the target host",
            Severity::Medium,
            |ctx| Box::new(NetworkSecurityProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            TlsSecurityProbe::NAME,
            "SSL/TLS Security",
            ProbeCategory::Infrastructure,
            "Plaintext transport and untrusted certificates",
            Severity::Medium,
            |ctx| Box::new(TlsSecurityProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            DnsSecurityProbe::NAME,
            "DNS Security",
            ProbeCategory::Infrastructure,
            "Resolution failures and address disclosure",
            Severity::Low,
            |ctx| Box::new(DnsSecurityProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            EmailSecurityProbe::NAME,
            "Email Security",
            ProbeCategory::Infrastructure,
            "Mail header injection and missing SPF/DMARC policy",
            Severity::Medium,
            |ctx| Box::new(EmailSecurityProbe::new(ctx)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_ports_are_not_candidates() {
        let candidates: Vec<u16> = COMMON_PORTS
            .iter()
            .copied()
            .filter(|port| !WEB_PORTS.contains(port))
            .collect();
        assert_eq!(candidates.len(), COMMON_PORTS.len() - 2);
        assert!(!candidates.contains(&443));
    }

    #[test]
    fn test_resolvable_name_skips_literals() {
        assert_eq!(resolvable_name("10.0.0.1"), None);
        assert_eq!(resolvable_name("::1"), None);
        assert_eq!(resolvable_name("LOCALHOST"), None);
        assert_eq!(resolvable_name("example.com."), Some("example.com"));
    }

    #[test]
    fn test_rejected_certificate_is_medium_finding() {
        let http = std::sync::Arc::new(crate::http_client::HttpClient::new(5, 0).unwrap());
        let ctx = ProbeContext::new("https://self-signed.example.com", http, Duration::from_secs(5));
        let mut found = FindingCollector::new(&ctx, TlsSecurityProbe::NAME);
        let relaxed = HttpResponse {
            status_code: 200,
            body: String::new(),
            headers: Default::default(),
            final_url: ctx.target.clone(),
            duration_ms: 3,
        };

        untrusted_certificate(
            &mut found,
            &anyhow::anyhow!("invalid peer certificate: UnknownIssuer"),
            &relaxed,
        );

        let findings = found.finish();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Medium);
        assert!(findings[0].id().starts_with("ssl_tls_"));
        assert_eq!(findings[0].probe_name(), "infra_ssl_tls_security");
        assert_eq!(findings[0].evidence()["response_status"], 200);
        assert!(findings[0].evidence()["verification_error"]
            .as_str()
            .unwrap()
            .contains("UnknownIssuer"));
    }

    #[test]
    fn test_service_names() {
        assert_eq!(service_name(22), "ssh");
        assert_eq!(service_name(5432), "postgresql");
        assert_eq!(service_name(8081), "unknown");
    }
}
