use std::fmt;

use crate::server::error::{AppResult, Error};

/// where the proxy is mounted, every proxied url looks like `<origin>/proxy/<scheme>/<rest>`
pub const PROXY_ROUTE_PREFIX: &str = "/proxy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// upstream resource of one proxy request. built per request and never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub scheme: Scheme,
    /// host with the port if there was one
    pub host: String,
    /// always starts with `/`, kept percent-encoded as received
    pub path: String,
    pub query: Option<String>,
}

impl ProxyTarget {
    /// rebuilds the target from the raw request path and query.
    ///
    /// the router's wildcard never sees the query string, so this deliberately works off the
    /// original uri instead of route params. `path` has to start with [`PROXY_ROUTE_PREFIX`]
    pub fn from_request_path(path: &str, query: Option<&str>) -> AppResult<Self> {
        let tunneled = path
            .strip_prefix(PROXY_ROUTE_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| Error::BadRequest("not a proxy path".to_string()))?;

        let (scheme, rest) = tunneled.split_once('/').unwrap_or((tunneled, ""));
        let scheme = Scheme::parse(scheme)
            .ok_or_else(|| Error::BadRequest(format!("unsupported scheme '{}'", scheme)))?;

        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        if host.is_empty() {
            return Err(Error::BadRequest("missing upstream host".to_string()));
        }

        let target = Self {
            scheme,
            host: host.to_string(),
            path: path.to_string(),
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        };

        // anything url can't make sense of would just fail later inside reqwest
        url::Url::parse(&target.url()).map_err(|e| {
            Error::BadRequest(format!("invalid upstream url {}: {}", target.url(), e))
        })?;

        Ok(target)
    }

    /// the absolute upstream url
    pub fn url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}://{}{}?{}", self.scheme, self.host, self.path, query),
            None => format!("{}://{}{}", self.scheme, self.host, self.path),
        }
    }

    /// the directory the target sits in, `https://cdn/live/index.m3u8?t=1` gives
    /// `https://cdn/live/`. relative manifest entries resolve against this
    pub fn base_directory(&self) -> String {
        let dir_end = self.path.rfind('/').map_or(0, |idx| idx + 1);
        format!("{}://{}{}", self.scheme, self.host, &self.path[..dir_end])
    }
}

/// `<origin>/proxy/<scheme>/<rest>` for an absolute http(s) url, `None` for anything else
pub fn proxied_url(origin: &str, absolute_url: &str) -> Option<String> {
    let (scheme, rest) = if let Some(rest) = absolute_url.strip_prefix("https://") {
        (Scheme::Https, rest)
    } else if let Some(rest) = absolute_url.strip_prefix("http://") {
        (Scheme::Http, rest)
    } else {
        return None;
    };

    Some(format!(
        "{}{}/{}/{}",
        origin.trim_end_matches('/'),
        PROXY_ROUTE_PREFIX,
        scheme,
        rest
    ))
}
