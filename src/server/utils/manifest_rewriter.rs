use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::proxy_target::{PROXY_ROUTE_PREFIX, proxied_url};

const KEY_DIRECTIVE: &str = "#EXT-X-KEY";

static KEY_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"URI="([^"]*)""#).expect("Static regex should compile"));

/// what a single manifest line is, as far as rewriting cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestLine<'a> {
    Blank,
    /// `#EXT-X-KEY` with a quoted `URI`, `start..end` is the byte range of the value in the line
    KeyUri { uri: &'a str, start: usize, end: usize },
    /// any other `#` line, comments included
    Directive,
    /// segment or sub-playlist reference, already trimmed
    Uri(&'a str),
}

pub fn classify_line(line: &str) -> ManifestLine<'_> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return ManifestLine::Blank;
    }

    if !trimmed.starts_with('#') {
        return ManifestLine::Uri(trimmed);
    }

    if trimmed.starts_with(KEY_DIRECTIVE) {
        if let Some(value) = KEY_URI.captures(line).and_then(|c| c.get(1)) {
            return ManifestLine::KeyUri {
                uri: value.as_str(),
                start: value.start(),
                end: value.end(),
            };
        }
    }

    ManifestLine::Directive
}

/// turns one uri reference from a manifest into its proxied form.
///
/// absolute http(s) urls keep their text as is, anything else is joined onto `base_directory`.
/// returns `None` when the reference can't be resolved or doesn't end up as http(s), the caller
/// leaves those alone
pub fn rewrite_uri(raw: &str, base_directory: &str, origin: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if is_proxied(raw, origin) {
        return Some(raw.to_string());
    }

    let absolute = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        match url::Url::parse(base_directory).and_then(|base| base.join(raw)) {
            Ok(resolved) => resolved.to_string(),
            Err(e) => {
                warn!("Failed to resolve {} against {}: {}", raw, base_directory, e);
                return None;
            }
        }
    };

    let proxied = proxied_url(origin, &absolute);
    if proxied.is_none() {
        debug!("Leaving non http(s) uri untouched: {}", absolute);
    }
    proxied
}

/// rewrites every segment, sub-playlist and key uri of an hls manifest so the player fetches them
/// back through `origin`. everything else, line endings included, comes out exactly as it went in
pub fn rewrite_manifest(text: &str, base_directory: &str, origin: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    let mut rewritten = 0usize;

    for raw_line in text.split_inclusive('\n') {
        let (line, ending) = split_line_ending(raw_line);

        match classify_line(line) {
            ManifestLine::Uri(uri) => match rewrite_uri(uri, base_directory, origin) {
                Some(proxied) => {
                    out.push_str(&proxied);
                    rewritten += 1;
                }
                None => out.push_str(line),
            },
            ManifestLine::KeyUri { uri, start, end } => {
                match rewrite_uri(uri, base_directory, origin) {
                    Some(proxied) => {
                        out.push_str(&line[..start]);
                        out.push_str(&proxied);
                        out.push_str(&line[end..]);
                        rewritten += 1;
                    }
                    None => out.push_str(line),
                }
            }
            ManifestLine::Blank | ManifestLine::Directive => out.push_str(line),
        }

        out.push_str(ending);
    }

    debug!("Rewrote {} uris in manifest from {}", rewritten, base_directory);
    out
}

/// an url that already points back at this proxy
fn is_proxied(uri: &str, origin: &str) -> bool {
    let origin = origin.trim_end_matches('/');
    uri.strip_prefix(origin)
        .and_then(|rest| rest.strip_prefix(PROXY_ROUTE_PREFIX))
        .is_some_and(|rest| rest.starts_with("/http/") || rest.starts_with("/https/"))
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(stripped) = line.strip_suffix("\r\n") {
        (stripped, "\r\n")
    } else if let Some(stripped) = line.strip_suffix('\n') {
        (stripped, "\n")
    } else {
        (line, "")
    }
}
