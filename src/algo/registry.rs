use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::RegistryError;

/// Env var naming a registry JSON file that replaces the built-in table.
pub const REGISTRY_ENV: &str = "SOCIAL_CLEAN_REGISTRY";

/// Built-in platforms in lookup order: (key, display name, hostnames, tracking params).
///
/// Hostnames are matched as substrings, first entry wins, so a short hostname
/// listed early shadows anything later that contains it.
const BUILTIN: &[(&str, &str, &[&str], &[&str])] = &[
    (
        "instagram",
        "Instagram",
        &["instagram.com", "instagr.am"],
        &["igsh", "igshid", "ig_rid", "ig_mid"],
    ),
    (
        "facebook",
        "Facebook",
        &["facebook.com", "fb.com", "fb.watch", "fb.me"],
        &[
            "fbclid", "mibextid", "sfnsn", "rdid", "share_url", "refsrc", "hc_ref", "paipv", "eav",
            "hrc", "__cft__", "__tn__",
        ],
    ),
    (
        "threads",
        "Threads",
        &["threads.net", "threads.com"],
        &["igshid", "xmt", "slof"],
    ),
    (
        "tiktok",
        "TikTok",
        &["tiktok.com"],
        &[
            "is_from_webapp",
            "sender_device",
            "sender_web_id",
            "share_app_id",
            "share_link_id",
            "share_item_id",
            "u_code",
            "preview_pb",
            "timestamp",
            "user_id",
            "tt_from",
            "checksum",
            "is_copy_url",
            "web_id",
        ],
    ),
    (
        "twitter",
        "X (Twitter)",
        &["twitter.com", "x.com"],
        &["s", "ref_src", "ref_url", "twclid"],
    ),
    (
        "youtube",
        "YouTube",
        &["youtube.com", "youtu.be", "youtube-nocookie.com"],
        &[
            "si",
            "feature",
            "pp",
            "ab_channel",
            "embeds_referring_euri",
            "embeds_referring_origin",
            "source_ve_path",
        ],
    ),
];

/// One supported platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub key: String,
    pub display_name: String,
    pub hostnames: Vec<String>,
    #[serde(default)]
    pub tracking_params: Vec<String>,
}

impl PlatformSpec {
    /// True if any of this platform's hostnames occurs inside `host`.
    /// `host` must already be lowercase.
    pub fn matches_host(&self, host: &str) -> bool {
        self.hostnames.iter().any(|h| host.contains(h.as_str()))
    }
}

/// Ordered, read-only platform table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    platforms: Vec<PlatformSpec>,
}

impl Registry {
    /// The compiled-in platform table.
    pub fn builtin() -> Self {
        let platforms = BUILTIN
            .iter()
            .map(|(key, name, hosts, params)| PlatformSpec {
                key: (*key).into(),
                display_name: (*name).into(),
                hostnames: hosts.iter().map(|h| (*h).into()).collect(),
                tracking_params: params.iter().map(|p| (*p).into()).collect(),
            })
            .collect();
        Self { platforms }
    }

    /// Build a registry from specs, validating and lowercasing hostnames.
    /// Declaration order is preserved and becomes lookup order.
    pub fn from_specs(specs: Vec<PlatformSpec>) -> Result<Self, RegistryError> {
        if specs.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut platforms = Vec::with_capacity(specs.len());
        for mut spec in specs {
            let key = spec.key.trim().to_string();
            if key.is_empty() {
                return Err(RegistryError::InvalidEntry {
                    key: spec.display_name,
                    reason: "empty key".into(),
                });
            }
            if spec.display_name.trim().is_empty() {
                return Err(RegistryError::InvalidEntry {
                    key,
                    reason: "empty display_name".into(),
                });
            }
            spec.hostnames = spec
                .hostnames
                .iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect();
            if spec.hostnames.is_empty() {
                return Err(RegistryError::InvalidEntry {
                    key,
                    reason: "no hostnames".into(),
                });
            }
            if !seen.insert(key.clone()) {
                return Err(RegistryError::DuplicateKey(key));
            }
            spec.key = key;
            platforms.push(spec);
        }

        Ok(Self { platforms })
    }

    /// Parse a registry from a JSON array of platform objects.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let specs: Vec<PlatformSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    /// Load a registry from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load from `path` if given, otherwise fall back to [`Registry::discover`].
    pub fn load(path: Option<&Path>) -> Result<Self, RegistryError> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::discover()),
        }
    }

    /// Resolve the registry using this order:
    ///
    /// 1. `$SOCIAL_CLEAN_REGISTRY` (path to JSON file)
    /// 2. `$XDG_DATA_HOME/social-clean/registry.json`
    /// 3. `~/.local/share/social-clean/registry.json`
    /// 4. the built-in table
    ///
    /// A file that exists but fails to load is logged and skipped.
    pub fn discover() -> Self {
        if let Ok(path) = std::env::var(REGISTRY_ENV) {
            match Self::from_path(Path::new(&path)) {
                Ok(reg) => return reg,
                Err(e) => log::warn!("ignoring registry from ${REGISTRY_ENV} ({path}): {e}"),
            }
        }

        if let Some(path) = xdg_registry_path() {
            if path.exists() {
                match Self::from_path(&path) {
                    Ok(reg) => return reg,
                    Err(e) => log::warn!("ignoring registry at {}: {e}", path.display()),
                }
            }
        }

        Self::builtin()
    }

    /// First platform, in declaration order, whose hostname set matches `hostname`.
    pub fn lookup(&self, hostname: &str) -> Option<&PlatformSpec> {
        let host = hostname.to_lowercase();
        self.platforms.iter().find(|p| p.matches_host(&host))
    }

    pub fn get(&self, key: &str) -> Option<&PlatformSpec> {
        self.platforms.iter().find(|p| p.key == key)
    }

    pub fn platforms(&self) -> &[PlatformSpec] {
        &self.platforms
    }

    pub fn display_names(&self) -> Vec<String> {
        self.platforms.iter().map(|p| p.display_name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// Pretty JSON of the table, loadable again with [`Registry::from_json`].
    /// Useful for seeding a user override file.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.platforms).unwrap_or_else(|_| "[]".into())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn xdg_registry_path() -> Option<PathBuf> {
    let data_home = std::env::var("XDG_DATA_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".local/share"))
        })?;
    Some(data_home.join("social-clean/registry.json"))
}
