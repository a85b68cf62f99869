//! Content platform detection
//!
//! Maps a URL to one of the hosting services we know about by plain substring
//! containment. Matching is deliberately loose so subdomains (`m.`, `www.`,
//! regional hosts) are recognised; a URL that merely mentions a domain in its
//! query string can be misclassified. The result is only used for display and
//! endpoint routing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known hosting services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Instagram,
    Facebook,
    Twitter,
    Tiktok,
    Linkedin,
    Pinterest,
    Snapchat,
    Unknown,
}

/// Domain table, checked in order. The first contained domain wins.
const DOMAIN_TABLE: &[(&str, Platform)] = &[
    ("youtube.com", Platform::Youtube),
    ("youtu.be", Platform::Youtube),
    ("instagram.com", Platform::Instagram),
    ("facebook.com", Platform::Facebook),
    ("twitter.com", Platform::Twitter),
    ("x.com", Platform::Twitter),
    ("tiktok.com", Platform::Tiktok),
    ("linkedin.com", Platform::Linkedin),
    ("pinterest.com", Platform::Pinterest),
    ("snapchat.com", Platform::Snapchat),
];

impl Platform {
    /// Every platform except `Unknown`, in table order.
    pub const KNOWN: [Platform; 8] = [
        Platform::Youtube,
        Platform::Instagram,
        Platform::Facebook,
        Platform::Twitter,
        Platform::Tiktok,
        Platform::Linkedin,
        Platform::Pinterest,
        Platform::Snapchat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Twitter => "twitter",
            Platform::Tiktok => "tiktok",
            Platform::Linkedin => "linkedin",
            Platform::Pinterest => "pinterest",
            Platform::Snapchat => "snapchat",
            Platform::Unknown => "unknown",
        }
    }

    /// Human readable name ("Youtube", "Tiktok", ...)
    pub fn display_name(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Platform::Unknown
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ();

    /// Parses a known platform name. `unknown` is not accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::KNOWN
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Classify a URL by the first table domain it contains.
pub fn detect_platform(url: &str) -> Platform {
    DOMAIN_TABLE
        .iter()
        .find(|(domain, _)| url.contains(domain))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Unknown)
}
