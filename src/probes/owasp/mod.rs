// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! OWASP Top 10 probe family.

pub mod access;
pub mod exposure;
pub mod injection;
pub mod misconfiguration;

pub use access::{BrokenAccessControlProbe, BrokenAuthenticationProbe};
pub use exposure::{InsufficientLoggingProbe, KnownVulnerabilitiesProbe, SensitiveDataExposureProbe};
pub use injection::{
    CrossSiteScriptingProbe, InsecureDeserializationProbe, SqlInjectionProbe, XxeProbe,
};
pub use misconfiguration::SecurityMisconfigurationProbe;

use crate::registry::ProbeDescriptor;
use crate::types::{ProbeCategory, Severity};

pub fn descriptors() -> Vec<ProbeDescriptor> {
    vec![
        ProbeDescriptor::new(
            SqlInjectionProbe::NAME,
            "SQL Injection",
            ProbeCategory::Owasp,
            "SQL error signatures returned for injected query parameters",
            Severity::High,
            |ctx| Box::new(SqlInjectionProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            BrokenAuthenticationProbe::NAME,
            "Broken Authentication",
            ProbeCategory::Owasp,
            "Weak passwords, insecure session cookies, common credentials and missing brute force protection",
            Severity::High,
            |ctx| Box::new(BrokenAuthenticationProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            SensitiveDataExposureProbe::NAME,
            "Sensitive Data Exposure",
            ProbeCategory::Owasp,
            "Personal data, debug output and verbose errors in responses",
            Severity::High,
            |ctx| Box::new(SensitiveDataExposureProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            XxeProbe::NAME,
            "XML External Entities",
            ProbeCategory::Owasp,
            "External entity resolution in XML endpoints",
            Severity::High,
            |ctx| Box::new(XxeProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            BrokenAccessControlProbe::NAME,
            "Broken Access Control",
            ProbeCategory::Owasp,
            "Horizontal and vertical privilege escalation, IDOR and path traversal",
            Severity::Critical,
            |ctx| Box::new(BrokenAccessControlProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            SecurityMisconfigurationProbe::NAME,
            "Security Misconfiguration",
            ProbeCategory::Owasp,
            "Default credentials, exposed directories, banner headers and debug mode",
            Severity::Critical,
            |ctx| Box::new(SecurityMisconfigurationProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            CrossSiteScriptingProbe::NAME,
            "Cross Site Scripting",
            ProbeCategory::Owasp,
            "Reflected, stored and DOM based script injection",
            Severity::High,
            |ctx| Box::new(CrossSiteScriptingProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            InsecureDeserializationProbe::NAME,
            "Insecure Deserialization",
            ProbeCategory::Owasp,
            "Endpoints accepting Java, PHP or pickle serialized objects",
            Severity::Critical,
            |ctx| Box::new(InsecureDeserializationProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            KnownVulnerabilitiesProbe::NAME,
            "Known Vulnerabilities",
            ProbeCategory::Owasp,
            "Version banners, known-vulnerable components and exposed dependency manifests",
            Severity::High,
            |ctx| Box::new(KnownVulnerabilitiesProbe::new(ctx)),
        ),
        ProbeDescriptor::new(
            InsufficientLoggingProbe::NAME,
            "Insufficient Logging",
            ProbeCategory::Owasp,
            "Log injection and publicly reachable audit or monitoring endpoints",
            Severity::Medium,
            |ctx| Box::new(InsufficientLoggingProbe::new(ctx)),
        ),
    ]
}
