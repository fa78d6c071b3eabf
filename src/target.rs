//! Connectivity target parsing
//!
//! Parses the `--to` destination into host and port. Purely syntactic: no
//! DNS lookups happen here, a mistyped hostname only shows up later in the
//! probe container's output.

use std::fmt;

use crate::{Error, Result};

/// Destination the probe container connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityTarget {
    host: String,
    port: String,
}

impl ConnectivityTarget {
    /// Parse a `host:port` string
    ///
    /// IPv6 literals must be bracketed (`[::1]:80`). Inputs with extra colons
    /// such as `host:port:extra` are rejected rather than repaired.
    ///
    /// ```
    /// use kubectl_reach::ConnectivityTarget;
    ///
    /// let target = ConnectivityTarget::parse("google.com:443").unwrap();
    /// assert_eq!(target.host(), "google.com");
    /// assert_eq!(target.port(), "443");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let (host, port) = split_host_port(raw).map_err(|reason| invalid(raw, reason))?;

        if host.is_empty() || port.is_empty() {
            return Err(invalid(raw, "host and port must be non-empty"));
        }

        Ok(Self {
            host: host.to_string(),
            port: port.to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

impl fmt::Display for ConnectivityTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn invalid(raw: &str, reason: &str) -> Error {
    Error::InvalidTarget {
        raw: raw.to_string(),
        reason: reason.to_string(),
    }
}

/// Split at the last colon, honouring the bracketed IPv6 form
fn split_host_port(raw: &str) -> std::result::Result<(&str, &str), &'static str> {
    let colon = raw.rfind(':').ok_or("expected host:port, missing port")?;

    let (host, open_from, close_from) = if let Some(rest) = raw.strip_prefix('[') {
        let close = rest.find(']').ok_or("missing ']' in address")? + 1;
        match raw.get(close + 1..close + 2) {
            None => return Err("expected host:port, missing port"),
            Some(":") if close + 1 == colon => {}
            Some(":") => return Err("too many colons in address"),
            Some(_) => return Err("expected host:port, missing port"),
        }
        (&raw[1..close], 1, close + 1)
    } else {
        let host = &raw[..colon];
        if host.contains(':') {
            return Err("too many colons in address");
        }
        (host, 0, 0)
    };

    if raw[open_from..].contains('[') || raw[close_from..].contains(']') {
        return Err("unexpected bracket in address");
    }

    Ok((host, &raw[colon + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(raw: &str) -> (String, String) {
        let target = ConnectivityTarget::parse(raw).unwrap();
        (target.host().to_string(), target.port().to_string())
    }

    #[test]
    fn test_parse_valid_targets() {
        assert_eq!(ok("google.com:443"), ("google.com".into(), "443".into()));
        assert_eq!(ok("10.0.0.5:8080"), ("10.0.0.5".into(), "8080".into()));
        assert_eq!(ok("myservice:80"), ("myservice".into(), "80".into()));
        assert_eq!(ok("localhost:9090"), ("localhost".into(), "9090".into()));
        assert_eq!(
            ok("db.prod.svc.cluster.local:5432"),
            ("db.prod.svc.cluster.local".into(), "5432".into())
        );
    }

    #[test]
    fn test_parse_ipv6_brackets() {
        assert_eq!(ok("[::1]:80"), ("::1".into(), "80".into()));
        assert_eq!(ok("[fd00::5]:8443"), ("fd00::5".into(), "8443".into()));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in [
            "",
            "hostonly",
            ":443",
            "host:",
            "host:port:extra",
            "::1:80",
            "[::1]",
            "[::1]80",
            "[::1:80",
            "[::1]]:80",
            "ho[st:80",
            "ho]st:80",
        ] {
            let result = ConnectivityTarget::parse(raw);
            assert!(
                matches!(result, Err(Error::InvalidTarget { .. })),
                "expected {raw:?} to be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn test_display_round_trips_brackets() {
        assert_eq!(ok_target("google.com:443").to_string(), "google.com:443");
        assert_eq!(ok_target("[::1]:80").to_string(), "[::1]:80");
    }

    fn ok_target(raw: &str) -> ConnectivityTarget {
        ConnectivityTarget::parse(raw).unwrap()
    }
}
