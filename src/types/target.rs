//! Target types with URL normalization and raw-request support.
//!
//! A [`Target`] is one scannable HTTP endpoint, held as a fully-qualified
//! base request: method, URL, headers, and an optional body. Construction
//! supports:
//! - Plain URLs ("https://example.com/app")
//! - Bare hosts ("example.com", "10.0.0.5:8080") — `http://` is assumed
//! - Serialized raw HTTP requests, with the URL rebuilt from the `Host`
//!   header when the request-target is relative
//!
//! Targets are immutable once built and are shared read-only across every
//! task that probes them.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Error type for target parsing and construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("empty target")]
    Empty,
    #[error("invalid target URL '{0}': {1}")]
    InvalidUrl(String, String),
    #[error("unsupported scheme '{0}' (only http and https)")]
    UnsupportedScheme(String),
    #[error("target has no host")]
    MissingHost,
    #[error("malformed raw request: {0}")]
    MalformedRaw(String),
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
}

/// One scannable HTTP endpoint, normalized at construction.
#[derive(Debug, Clone)]
pub struct Target {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: Option<String>,
}

impl Target {
    /// Parse a target from a URL or bare host string.
    ///
    /// A bare host or IP without a scheme defaults to `http://`, matching
    /// the common scanner convention of probing plaintext first.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        let url = Url::parse(&candidate)
            .map_err(|e| TargetError::InvalidUrl(trimmed.to_string(), e.to_string()))?;

        Self::from_url(url)
    }

    /// Build a target from an already-parsed URL.
    pub fn from_url(url: Url) -> Result<Self, TargetError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().is_none() {
            return Err(TargetError::MissingHost);
        }

        Ok(Self {
            url,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// Reconstruct a target from a serialized raw HTTP request.
    ///
    /// When the request-target on the first line is relative, the URL is
    /// rebuilt from the `Host` header; `force_tls` then decides between
    /// `https` and `http`. An absolute request-target is used as-is.
    pub fn from_raw(raw: &str, force_tls: bool) -> Result<Self, TargetError> {
        let normalized = raw.replace("\r\n", "\n");
        let (head, body) = match normalized.find("\n\n") {
            Some(idx) => {
                let tail = &normalized[idx + 2..];
                let body = if tail.is_empty() {
                    None
                } else {
                    Some(tail.to_string())
                };
                (&normalized[..idx], body)
            }
            None => (normalized.trim_end(), None),
        };

        let mut lines = head.lines();
        let request_line = lines.next().filter(|l| !l.trim().is_empty()).ok_or_else(|| {
            TargetError::MalformedRaw("missing request line".to_string())
        })?;

        let mut parts = request_line.split_whitespace();
        let method_str = parts
            .next()
            .ok_or_else(|| TargetError::MalformedRaw("missing method".to_string()))?;
        let request_target = parts
            .next()
            .ok_or_else(|| TargetError::MalformedRaw("missing request-target".to_string()))?;

        let method = Method::from_str(method_str).map_err(|_| {
            TargetError::MalformedRaw(format!("unknown method '{}'", method_str))
        })?;

        let mut headers = HeaderMap::new();
        let mut host: Option<String> = None;
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| TargetError::MalformedRaw(format!("bad header line '{}'", line)))?;
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("host") {
                host = Some(value.to_string());
            }
            let header_name = HeaderName::from_str(name)
                .map_err(|_| TargetError::InvalidHeader(name.to_string()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TargetError::InvalidHeader(name.to_string()))?;
            headers.append(header_name, header_value);
        }

        let url = if request_target.starts_with("http://") || request_target.starts_with("https://")
        {
            Url::parse(request_target).map_err(|e| {
                TargetError::InvalidUrl(request_target.to_string(), e.to_string())
            })?
        } else {
            let host = host.ok_or(TargetError::MissingHost)?;
            let scheme = if force_tls { "https" } else { "http" };
            let absolute = format!("{}://{}{}", scheme, host, request_target);
            Url::parse(&absolute)
                .map_err(|e| TargetError::InvalidUrl(absolute.clone(), e.to_string()))?
        };

        let mut target = Self::from_url(url)?;
        target.method = method;
        target.headers = headers;
        target.body = body;
        Ok(target)
    }

    /// Attach a header, replacing any existing value under the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, TargetError> {
        let header_name =
            HeaderName::from_str(name).map_err(|_| TargetError::InvalidHeader(name.to_string()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| TargetError::InvalidHeader(name.to_string()))?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Attach a `Cookie` header.
    pub fn with_cookie(self, cookie: &str) -> Result<Self, TargetError> {
        self.with_header("cookie", cookie)
    }

    /// The target's full URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The base request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Headers carried into every probe against this target.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The base request body, if any.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Scheme, authority and path with the trailing slash trimmed.
    ///
    /// Rule paths are appended to this, so a target of
    /// `http://host/app/` and a rule path of `/.git/config` probe
    /// `http://host/app/.git/config`.
    pub fn base(&self) -> String {
        let mut base = format!(
            "{}://{}",
            self.url.scheme(),
            self.url.host_str().unwrap_or_default()
        );
        if let Some(port) = self.url.port() {
            base.push(':');
            base.push_str(&port.to_string());
        }
        base.push_str(self.url.path().trim_end_matches('/'));
        base
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_host_defaults_to_http() {
        let target = Target::parse("example.com").unwrap();
        assert_eq!(target.url().scheme(), "http");
        assert_eq!(target.url().host_str(), Some("example.com"));
    }

    #[test]
    fn test_parse_bare_host_with_port() {
        let target = Target::parse("10.0.0.5:8080").unwrap();
        assert_eq!(target.url().scheme(), "http");
        assert_eq!(target.url().port(), Some(8080));
    }

    #[test]
    fn test_parse_preserves_https() {
        let target = Target::parse("https://example.com/app").unwrap();
        assert_eq!(target.url().scheme(), "https");
        assert_eq!(target.url().path(), "/app");
    }

    #[test]
    fn test_parse_rejects_unsupported_scheme() {
        let result = Target::parse("ftp://example.com");
        assert!(matches!(result, Err(TargetError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(Target::parse("  "), Err(TargetError::Empty)));
    }

    #[test]
    fn test_base_trims_trailing_slash() {
        let target = Target::parse("http://example.com/app/").unwrap();
        assert_eq!(target.base(), "http://example.com/app");

        let target = Target::parse("example.com").unwrap();
        assert_eq!(target.base(), "http://example.com");
    }

    #[test]
    fn test_with_cookie() {
        let target = Target::parse("example.com")
            .unwrap()
            .with_cookie("session=abc123")
            .unwrap();
        assert_eq!(
            target.headers().get("cookie").unwrap().to_str().unwrap(),
            "session=abc123"
        );
    }

    #[test]
    fn test_from_raw_relative_target() {
        let raw = "POST /login HTTP/1.1\r\nHost: internal.test\r\nContent-Type: application/x-www-form-urlencoded\r\n\r\nuser=admin&pass=admin";
        let target = Target::from_raw(raw, false).unwrap();

        assert_eq!(target.method(), &Method::POST);
        assert_eq!(target.url().as_str(), "http://internal.test/login");
        assert_eq!(target.body(), Some("user=admin&pass=admin"));
        assert_eq!(
            target
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_from_raw_force_tls() {
        let raw = "GET /admin HTTP/1.1\nHost: internal.test\n";
        let target = Target::from_raw(raw, true).unwrap();
        assert_eq!(target.url().scheme(), "https");
        assert_eq!(target.url().path(), "/admin");
    }

    #[test]
    fn test_from_raw_absolute_target_wins() {
        let raw = "GET https://other.test/x HTTP/1.1\nHost: internal.test\n";
        let target = Target::from_raw(raw, false).unwrap();
        assert_eq!(target.url().host_str(), Some("other.test"));
        assert_eq!(target.url().scheme(), "https");
    }

    #[test]
    fn test_from_raw_missing_host_is_error() {
        let raw = "GET /x HTTP/1.1\nAccept: */*\n";
        assert!(matches!(
            Target::from_raw(raw, false),
            Err(TargetError::MissingHost)
        ));
    }

    #[test]
    fn test_from_raw_rejects_garbage() {
        assert!(matches!(
            Target::from_raw("", false),
            Err(TargetError::MalformedRaw(_))
        ));
        assert!(matches!(
            Target::from_raw("GET\n", false),
            Err(TargetError::MalformedRaw(_))
        ));
    }
}
