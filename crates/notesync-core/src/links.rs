//! URL detection and classification.
//!
//! This module provides functionality to:
//! - Extract bare URLs from note text
//! - Unwrap Microsoft Outlook SafeLinks pasted from mail
//! - Classify a URL as a website, LinkedIn profile or Twitter/X profile
//!
//! # Example
//!
//! ```
//! use notesync_core::links::{classify_url, extract_urls, UrlKind};
//!
//! let urls = extract_urls("Deck: https://acme.com/q3.pdf and more");
//! assert_eq!(urls, vec!["https://acme.com/q3.pdf".to_string()]);
//! assert_eq!(classify_url("https://www.linkedin.com/in/jane"), UrlKind::LinkedIn);
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Regex for extracting URLs from text.
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'\)\]]+"#).expect("Invalid URL regex"));

/// Regex for scheme-less profile/site mentions (`linkedin.com/in/jane`, `www.acme.com`).
static BARE_DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:www\.|linkedin\.com/|twitter\.com/|x\.com/)[^\s<>()\]]+")
        .expect("Invalid bare domain regex")
});

/// Regex for detecting Microsoft Outlook SafeLinks.
///
/// SafeLinks wrap the original URL in a redirect through `safelinks.protection.outlook.com`.
/// The original URL is encoded in the `url` query parameter.
static SAFELINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^/]*safelinks\.protection\.outlook\.com/?\?[^?]*url=([^&]+)")
        .expect("Invalid SafeLink regex")
});

/// What a URL points at, for contact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKind {
    /// A company or personal website.
    Website,
    /// A LinkedIn profile or page.
    LinkedIn,
    /// A Twitter / X profile.
    Twitter,
}

/// Extracts all URLs from the given text, SafeLinks unwrapped, in order, without duplicates.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    URL_REGEX
        .find_iter(text)
        .map(|m| unwrap_safelink(m.as_str().trim_end_matches(['.', ',', ';'])))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Finds the first URL-like token in a line, adding `https://` to bare domains.
pub fn find_url(line: &str) -> Option<String> {
    if let Some(m) = URL_REGEX.find(line) {
        return Some(unwrap_safelink(m.as_str().trim_end_matches(['.', ',', ';'])));
    }
    BARE_DOMAIN_REGEX
        .find(line)
        .map(|m| format!("https://{}", m.as_str().trim_end_matches(['.', ',', ';'])))
}

/// Classifies a URL by its host.
pub fn classify_url(url: &str) -> UrlKind {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default();
    let host = host.trim_start_matches("www.");

    if host == "linkedin.com" || host.ends_with(".linkedin.com") || host == "lnkd.in" {
        UrlKind::LinkedIn
    } else if host == "twitter.com" || host == "x.com" || host.ends_with(".twitter.com") {
        UrlKind::Twitter
    } else {
        UrlKind::Website
    }
}

/// Unwraps a Microsoft Outlook SafeLink to get the original URL.
///
/// If the URL is not a SafeLink, it is returned unchanged.
pub fn unwrap_safelink(url: &str) -> String {
    if let Some(caps) = SAFELINK_REGEX.captures(url) {
        if let Some(encoded) = caps.get(1) {
            if let Ok(decoded) = urlencoding::decode(encoded.as_str()) {
                return decoded.into_owned();
            }
        }
    }
    url.to_string()
}
