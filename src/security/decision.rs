//! Outcome of evaluating a request against the policy.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Result of a successful evaluation. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "value", rename_all = "snake_case")]
pub enum PolicyDecision {
    /// Send the client to HTTPS; downstream stages must not run.
    Redirect(Redirect),
    /// Continue, adding these headers to the eventual response.
    Headers(HeaderSet),
}

impl PolicyDecision {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    /// Header set of a pass-through decision.
    pub fn headers(&self) -> Option<&HeaderSet> {
        match self {
            Self::Headers(headers) => Some(headers),
            Self::Redirect(_) => None,
        }
    }
}

/// An HTTPS redirect instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub target: String,
    pub permanent: bool,
}

impl Redirect {
    /// 301 for permanent redirects, 307 otherwise.
    pub fn status(&self) -> StatusCode {
        if self.permanent {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::TEMPORARY_REDIRECT
        }
    }
}

/// Ordered response headers produced by the policy.
///
/// Order is the order of synthesis and is stable across evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderSet {
    entries: Vec<(HeaderName, String)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: HeaderName, value: impl Into<String>) {
        self.entries.push((name, value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.entries.iter().map(|(name, value)| (name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Merge into a response header map.
    ///
    /// Headers already present are left untouched. Values that are not
    /// valid header values are skipped. Returns the number of headers added.
    pub fn apply_to(&self, headers: &mut HeaderMap) -> usize {
        let mut applied = 0;
        for (name, value) in &self.entries {
            if headers.contains_key(name) {
                continue;
            }
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.insert(name.clone(), value);
                    applied += 1;
                }
                Err(_) => {
                    tracing::warn!(header = %name, "Skipping invalid security header value");
                }
            }
        }
        applied
    }
}

impl Serialize for HeaderSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Entry<'a>(&'a HeaderName, &'a str);

        impl Serialize for Entry<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("name", self.0.as_str())?;
                map.serialize_entry("value", self.1)?;
                map.end()
            }
        }

        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            seq.serialize_element(&Entry(name, value))?;
        }
        seq.end()
    }
}
