//! `scheme:path?query` endpoint URI parsing.

use crate::error::{EngineError, EngineErrorKind};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Parsed endpoint URI.
///
/// ```
/// use route_bridge::EndpointUri;
///
/// let uri: EndpointUri = "log:orders?level=INFO&showAll=true".parse().unwrap();
/// assert_eq!(uri.scheme(), "log");
/// assert_eq!(uri.path(), "orders");
/// assert_eq!(uri.query_param("level"), Some("INFO"));
///
/// assert!("no-scheme".parse::<EndpointUri>().is_err());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EndpointUri {
    scheme: String,
    path: String,
    query: Vec<(String, String)>,
}

impl EndpointUri {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn invalid(raw: &str, reason: &str) -> EngineError {
        EngineError::new(
            EngineErrorKind::InvalidUri,
            format!("invalid endpoint uri {raw:?}: {reason}"),
        )
    }

    fn is_valid_scheme(scheme: &str) -> bool {
        let mut chars = scheme.chars();
        matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
            && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
    }
}

impl FromStr for EndpointUri {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Self::invalid(raw, "empty uri"));
        }

        let Some((scheme, rest)) = trimmed.split_once(':') else {
            return Err(Self::invalid(raw, "missing scheme"));
        };
        if !Self::is_valid_scheme(scheme) {
            return Err(Self::invalid(raw, "malformed scheme"));
        }

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        let path = path.trim_start_matches("//");
        if path.is_empty() {
            return Err(Self::invalid(raw, "empty path"));
        }

        let mut parameters = Vec::new();
        for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(Self::invalid(raw, "query parameter without value"));
            };
            if key.is_empty() {
                return Err(Self::invalid(raw, "query parameter without name"));
            }
            parameters.push((key.to_string(), value.to_string()));
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            path: path.to_string(),
            query: parameters,
        })
    }
}

impl Display for EndpointUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)?;
        for (index, (key, value)) in self.query.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(f, "{separator}{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::EndpointUri;
    use crate::error::EngineErrorKind;

    #[test]
    fn parses_scheme_path_and_query() {
        let uri: EndpointUri = "file:///tmp/out.txt?append=true".parse().expect("valid");

        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.path(), "/tmp/out.txt");
        assert_eq!(uri.query_param("append"), Some("true"));
        assert_eq!(uri.query_param("missing"), None);
    }

    #[test]
    fn parses_offramp_style_paths() {
        let uri: EndpointUri = "local:flow=abc-123endpoint=1".parse().expect("valid");

        assert_eq!(uri.scheme(), "local");
        assert_eq!(uri.path(), "flow=abc-123endpoint=1");
    }

    #[test]
    fn rejects_malformed_uris() {
        for raw in ["", "   ", "mock", ":out", "1mock:out", "mock:", "mock:?a=1", "log:x?level"] {
            let err = raw.parse::<EndpointUri>().expect_err(raw);
            assert_eq!(err.kind(), EngineErrorKind::InvalidUri, "{raw}");
        }
    }

    #[test]
    fn display_round_trips_normalized_form() {
        let uri: EndpointUri = "LOG:orders?level=OFF&style=Fixed".parse().expect("valid");

        assert_eq!(uri.to_string(), "log:orders?level=OFF&style=Fixed");
    }
}
