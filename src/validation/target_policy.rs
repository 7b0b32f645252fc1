// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Target Policy
 * Syntax validation and allow/deny decisions for suite targets
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::debug;
use url::{Host, Url};

use crate::config::ScannerConfig;
use crate::errors::SuiteError;

/// Outcome of a policy check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PolicyDecision {
    Allow,
    Deny { reason: String },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }
}

/// Decides whether testing a target is permitted
pub trait TargetPolicy: Send + Sync {
    fn check(&self, target: &str) -> PolicyDecision;
}

/// Parse a target and require an http(s) scheme with a host
pub fn validate_target_syntax(target: &str) -> Result<Url, SuiteError> {
    let invalid = |reason: &str| SuiteError::InvalidTarget {
        target: target.to_string(),
        reason: reason.to_string(),
    };

    if target.trim().is_empty() {
        return Err(invalid("target is empty"));
    }

    let url = Url::parse(target.trim()).map_err(|e| invalid(&e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(&format!("unsupported scheme '{}'", other))),
    }

    if url.host().is_none() {
        return Err(invalid("missing host"));
    }

    Ok(url)
}

/// Permits every syntactically valid target. For lab environments and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllPolicy;

impl TargetPolicy for AllowAllPolicy {
    fn check(&self, _target: &str) -> PolicyDecision {
        PolicyDecision::Allow
    }
}

/// Default policy: local/internal hosts in safe mode plus an explicit deny list
#[derive(Debug, Clone)]
pub struct DenyListPolicy {
    safe_mode: bool,
    denied_hosts: Vec<String>,
}

impl DenyListPolicy {
    pub fn new(safe_mode: bool, denied_hosts: Vec<String>) -> Self {
        Self {
            safe_mode,
            denied_hosts: denied_hosts
                .into_iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.safe_testing_mode, config.denied_hosts.clone())
    }

    fn matches_denied(&self, host: &str) -> bool {
        self.denied_hosts.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix("*.") {
                host.ends_with(&format!(".{}", suffix)) || host == suffix
            } else {
                host == pattern
            }
        })
    }
}

impl Default for DenyListPolicy {
    fn default() -> Self {
        Self::new(true, Vec::new())
    }
}

impl TargetPolicy for DenyListPolicy {
    fn check(&self, target: &str) -> PolicyDecision {
        let url = match validate_target_syntax(target) {
            Ok(url) => url,
            Err(e) => {
                return PolicyDecision::Deny {
                    reason: e.to_string(),
                }
            }
        };

        let host = match url.host() {
            Some(host) => host,
            None => {
                return PolicyDecision::Deny {
                    reason: "missing host".to_string(),
                }
            }
        };

        let host_label = host.to_string().to_lowercase();
        if self.matches_denied(host_label.trim_matches(|c| c == '[' || c == ']')) {
            debug!("Target {} is on the deny list", target);
            return PolicyDecision::Deny {
                reason: format!("host {} is on the deny list", host_label),
            };
        }

        if self.safe_mode {
            if let Some(reason) = internal_host_reason(&host) {
                debug!("Target {} refused in safe testing mode: {}", target, reason);
                return PolicyDecision::Deny { reason };
            }
        }

        PolicyDecision::Allow
    }
}

fn internal_host_reason(host: &Host<&str>) -> Option<String> {
    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                Some(format!("{} resolves to the local machine", domain))
            } else {
                None
            }
        }
        Host::Ipv4(ip) => internal_ip_reason(IpAddr::V4(*ip)),
        Host::Ipv6(ip) => internal_ip_reason(IpAddr::V6(*ip)),
    }
}

/// Reason an address is internal, or None if it is publicly routable
pub fn internal_ip_reason(ip: IpAddr) -> Option<String> {
    match ip {
        IpAddr::V4(v4) => ipv4_reason(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => ipv4_reason(v4),
            None => ipv6_reason(v6),
        },
    }
}

fn ipv4_reason(ip: Ipv4Addr) -> Option<String> {
    let kind = if ip.is_loopback() {
        "loopback"
    } else if ip.is_private() {
        "private"
    } else if ip.is_link_local() {
        "link-local"
    } else if ip.is_unspecified() {
        "unspecified"
    } else {
        return None;
    };
    Some(format!("{} is a {} address", ip, kind))
}

fn ipv6_reason(ip: Ipv6Addr) -> Option<String> {
    let first = ip.segments()[0];
    let kind = if ip.is_loopback() {
        "loopback"
    } else if ip.is_unspecified() {
        "unspecified"
    } else if (first & 0xfe00) == 0xfc00 {
        "unique local"
    } else if (first & 0xffc0) == 0xfe80 {
        "link-local"
    } else {
        return None;
    };
    Some(format!("{} is a {} address", ip, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_validation() {
        assert!(validate_target_syntax("https://example.com").is_ok());
        assert!(validate_target_syntax("http://example.com:8080/app").is_ok());
        assert!(validate_target_syntax("").is_err());
        assert!(validate_target_syntax("example.com").is_err());
        assert!(validate_target_syntax("ftp://example.com").is_err());
        assert!(validate_target_syntax("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_localhost_denied_in_safe_mode() {
        let policy = DenyListPolicy::default();
        assert!(!policy.check("http://localhost:9999").is_allowed());
        assert!(!policy.check("http://127.0.0.1/").is_allowed());
        assert!(!policy.check("http://10.0.0.5/").is_allowed());
        assert!(!policy.check("http://192.168.1.1/").is_allowed());
        assert!(!policy.check("http://169.254.169.254/").is_allowed());
        assert!(!policy.check("http://[::1]:8080/").is_allowed());
        assert!(!policy.check("http://0.0.0.0/").is_allowed());
        assert!(policy.check("https://example.com").is_allowed());
        assert!(policy.check("http://8.8.8.8/").is_allowed());
    }

    #[test]
    fn test_safe_mode_off_allows_local() {
        let policy = DenyListPolicy::new(false, vec![]);
        assert!(policy.check("http://localhost:9999").is_allowed());
    }

    #[test]
    fn test_denied_hosts_with_wildcard() {
        let policy = DenyListPolicy::new(
            false,
            vec!["prod.example.com".to_string(), "*.bank.test".to_string()],
        );
        assert!(!policy.check("https://prod.example.com/x").is_allowed());
        assert!(!policy.check("https://api.bank.test").is_allowed());
        assert!(!policy.check("https://bank.test").is_allowed());
        assert!(policy.check("https://staging.example.com").is_allowed());
    }

    #[test]
    fn test_allow_all() {
        assert!(AllowAllPolicy.check("http://localhost").is_allowed());
    }
}
