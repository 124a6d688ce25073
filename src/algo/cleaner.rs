use serde::Serialize;
use url::{form_urlencoded, Url};

use super::registry::Registry;
use crate::error::CleanError;

/// Parameters that carry content identity (video id, timestamp, playlist).
/// Captured before any removal pass and re-appended last, in this order.
pub const KEEP_PARAMS: &[&str] = &["v", "t", "list"];

/// Tracking parameters stripped on every platform.
pub const UNIVERSAL_TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "gclid",
    "gad_source",
    "gbraid",
    "wbraid",
    "msclkid",
    "dclid",
    "oly_enc_id",
    "oly_anon_id",
    "vero_id",
    "vero_conv",
    "_ga",
    "_gl",
    "mc_cid",
    "mc_eid",
    "trk",
    "trkInfo",
    "share_source",
    "share_medium",
];

/// Any parameter starting with one of these is treated as tracking.
pub const TRACKING_PREFIXES: &[&str] = &["utm_", "fb_", "ig_", "ref", "_", "tt_"];

/// Hosts containing this never get a trailing slash (youtu.be/<id>, youtube.com/watch).
const SLASHLESS_HOST_MARKER: &str = "youtu";

/// Canonical URL plus the display name of the platform it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanResult {
    pub canonical_url: String,
    pub platform: String,
}

/// A [`CleanResult`] with the details front ends show to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanOutcome {
    pub result: CleanResult,
    pub platform_key: String,
    /// Names of removed parameters, each once, in the order they were removed.
    pub removed: Vec<String>,
}

/// Intermediate form of an input URL.
#[derive(Debug)]
struct ParsedUrl {
    origin: String,
    host: String,
    path: String,
    query: Vec<(String, String)>,
}

/// Stateless URL cleaner over an explicit, read-only [`Registry`].
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    registry: Registry,
}

impl Cleaner {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Strip tracking parameters from a social-media URL.
    ///
    /// ```
    /// use nu_plugin_social_clean::algo::cleaner::Cleaner;
    ///
    /// let cleaner = Cleaner::default();
    /// let r = cleaner.clean("instagram.com/p/abc123/?igsh=xyz").unwrap();
    /// assert_eq!(r.canonical_url, "https://instagram.com/p/abc123/");
    /// assert_eq!(r.platform, "Instagram");
    /// ```
    pub fn clean(&self, raw: &str) -> Result<CleanResult, CleanError> {
        self.clean_detailed(raw).map(|o| o.result)
    }

    /// Same as [`Cleaner::clean`], also reporting what was removed.
    pub fn clean_detailed(&self, raw: &str) -> Result<CleanOutcome, CleanError> {
        let parsed = parse(raw)?;

        let platform = self.registry.lookup(&parsed.host).ok_or_else(|| {
            log::debug!("no platform for host {}", parsed.host);
            CleanError::unsupported(self.registry.display_names())
        })?;
        log::debug!("host {} resolved to {}", parsed.host, platform.key);

        let ParsedUrl {
            origin,
            host,
            path,
            mut query,
        } = parsed;

        let kept = take_keep_params(&mut query);
        let mut removed: Vec<String> = Vec::new();

        strip(&mut query, &mut removed, |k| {
            platform.tracking_params.iter().any(|p| p == k)
        });
        strip(&mut query, &mut removed, |k| {
            UNIVERSAL_TRACKING_PARAMS.contains(&k)
        });
        strip(&mut query, &mut removed, |k| {
            TRACKING_PREFIXES.iter().any(|p| k.starts_with(p))
        });

        query.extend(kept);

        if !removed.is_empty() {
            log::debug!("removed {} from {}", removed.join(", "), platform.key);
        }

        Ok(CleanOutcome {
            result: CleanResult {
                canonical_url: reconstruct(&origin, &host, &path, &query),
                platform: platform.display_name.clone(),
            },
            platform_key: platform.key.clone(),
            removed,
        })
    }
}

fn parse(raw: &str) -> Result<ParsedUrl, CleanError> {
    let trimmed = raw.trim();
    let with_scheme = if starts_with_ignore_case(trimmed, "http://")
        || starts_with_ignore_case(trimmed, "https://")
    {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme).map_err(|e| {
        log::debug!("failed to parse {with_scheme:?}: {e}");
        CleanError::invalid_url()
    })?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(CleanError::invalid_url)?
        .to_lowercase();

    Ok(ParsedUrl {
        origin: url.origin().ascii_serialization(),
        host,
        path: url.path().to_string(),
        query: url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
    })
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Pull keep-list parameters out of `query`: first value of each, in keep-list order.
fn take_keep_params(query: &mut Vec<(String, String)>) -> Vec<(String, String)> {
    let kept: Vec<(String, String)> = KEEP_PARAMS
        .iter()
        .filter_map(|name| {
            query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(k, v)| (k.clone(), v.clone()))
        })
        .collect();
    query.retain(|(k, _)| !KEEP_PARAMS.contains(&k.as_str()));
    kept
}

fn strip(
    query: &mut Vec<(String, String)>,
    removed: &mut Vec<String>,
    is_tracking: impl Fn(&str) -> bool,
) {
    query.retain(|(k, _)| {
        if !is_tracking(k) {
            return true;
        }
        if !removed.contains(k) {
            removed.push(k.clone());
        }
        false
    });
}

fn reconstruct(origin: &str, host: &str, path: &str, query: &[(String, String)]) -> String {
    let mut out = format!("{origin}{path}");
    if !out.ends_with('/') && !host.contains(SLASHLESS_HOST_MARKER) {
        out.push('/');
    }
    if !query.is_empty() {
        let qs = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter())
            .finish();
        out.push('?');
        out.push_str(&qs);
    }
    out
}
