// ============================================================================
// Route Table
// ============================================================================
//
// Immutable prefix → upstream map built once at startup. Matching is
// longest-prefix on path-segment boundaries: `/auth` matches `/auth` and
// `/auth/login` but not `/authority`.
//
// ============================================================================

use reqwest::Url;

use crate::config::{ConfigError, GatewaySettings};

/// One validated route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Route name, used in logs
    pub name: String,
    /// Normalised prefix: leading `/`, no trailing `/` (empty for the root route)
    pub prefix: String,
    /// Absolute http(s) base URL of the upstream
    pub upstream: Url,
}

impl RouteEntry {
    pub fn new(name: &str, prefix: &str, upstream: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.to_string(),
            prefix: normalise_prefix(name, prefix)?,
            upstream: parse_upstream(name, upstream)?,
        })
    }

    /// Upstream URL for an already-rewritten path and the original query
    pub fn target_url(&self, path: &str, query: Option<&str>) -> Url {
        let mut url = self.upstream.clone();
        let joined = format!("{}{}", self.upstream.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url.set_query(query);
        url
    }

    /// The request path with this route's prefix removed, if the route applies
    fn rewrite(&self, path: &str) -> Option<String> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            None
        }
    }
}

/// Result of resolving a request path
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    /// Path to request from the upstream
    pub path: String,
}

/// Prefix routing table
#[derive(Debug, Clone)]
pub struct RouteTable {
    /// Sorted longest prefix first
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new(mut entries: Vec<RouteEntry>) -> Result<Self, ConfigError> {
        entries.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });

        if let Some(dup) = entries.windows(2).find(|w| w[0].prefix == w[1].prefix) {
            let prefix = if dup[0].prefix.is_empty() { "/" } else { dup[0].prefix.as_str() };
            return Err(ConfigError::DuplicatePrefix(prefix.to_string()));
        }

        Ok(Self { entries })
    }

    /// Build and validate the table from configuration
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, ConfigError> {
        let entries = settings
            .routes
            .iter()
            .map(|(name, route)| RouteEntry::new(name, &route.prefix, &route.upstream))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(entries)
    }

    /// Find the longest registered prefix covering `path`.
    ///
    /// Paths with `.` or `..` segments, literal or percent-encoded, never
    /// resolve: they would climb out of an upstream's base path.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        if has_dot_segment(path) {
            return None;
        }

        self.entries.iter().find_map(|entry| {
            entry
                .rewrite(path)
                .map(|rewritten| RouteMatch { entry, path: rewritten })
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}

fn has_dot_segment(path: &str) -> bool {
    path.split('/').any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}

fn normalise_prefix(route: &str, prefix: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidPrefix {
        route: route.to_string(),
        prefix: prefix.to_string(),
        reason: reason.to_string(),
    };

    if !prefix.starts_with('/') {
        return Err(invalid("must start with `/`"));
    }
    if prefix.contains(['?', '#']) || prefix.contains("//") {
        return Err(invalid("must be a plain path"));
    }

    Ok(prefix.trim_end_matches('/').to_string())
}

fn parse_upstream(route: &str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUpstream {
        route: route.to_string(),
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("must not carry a query or fragment".to_string()));
    }

    Ok(url)
}
