//! Identifier codec
//!
//! Parses `protocol:authority/identifier` strings into [`GlobalId`] values and
//! cleans raw identifier components. Parsing never raises: anything malformed
//! comes back as `None` and callers treat that as "not a valid external
//! identifier".

use crate::error::{PidError, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

/// Registry-assigned DOI prefix (`10.NNNN` with optional dotted sub-prefixes)
static DOI_AUTHORITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.\d+(\.\d+)*$").unwrap());

// =============================================================================
// PROTOCOL
// =============================================================================

/// Supported identifier schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Doi,
    Handle,
    /// Locally resolved permalinks; no remote registry
    Perma,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Doi => "doi",
            Protocol::Handle => "hdl",
            Protocol::Perma => "perma",
        }
    }

    /// Check an authority against scheme-specific rules.
    pub fn accepts_authority(&self, authority: &str) -> bool {
        match self {
            Protocol::Doi => DOI_AUTHORITY_RE.is_match(authority),
            Protocol::Handle | Protocol::Perma => !authority.is_empty(),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = PidError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "doi" => Ok(Protocol::Doi),
            "hdl" => Ok(Protocol::Handle),
            "perma" => Ok(Protocol::Perma),
            other => Err(PidError::UnsupportedProtocol(other.to_string())),
        }
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// GLOBAL ID
// =============================================================================

/// An immutable `protocol:authority/identifier` triple.
///
/// # Invariants
/// - `authority` holds no whitespace, `;` or `'`, and passes the protocol's
///   authority check (DOI prefix pattern for `doi`).
/// - Neither `authority` nor `identifier` contains a NUL byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalId {
    protocol: Protocol,
    authority: String,
    identifier: String,
}

impl GlobalId {
    /// Build a validated identifier from already-split components.
    pub fn new(protocol: Protocol, authority: &str, identifier: &str) -> Result<Self> {
        let namespace = Namespace::new(protocol, authority)?;
        let identifier = format_component(identifier);
        if identifier.is_empty() || identifier.contains('\0') {
            return Err(PidError::InvalidPid(format!(
                "{}:{}/{}",
                protocol, namespace.authority, identifier
            )));
        }
        Ok(namespace.global_id(identifier))
    }

    /// Parse `protocol:authority/identifier`.
    ///
    /// Splits on the first `:` and then on the first `/` after it. Returns
    /// `None` for unknown protocols, bad authorities, empty segments and
    /// embedded NULs.
    pub fn parse(text: &str) -> Option<Self> {
        let Some(colon) = text.find(':').filter(|&i| i > 0) else {
            debug!("Error parsing identifier: {}: '<protocol>:' not found", text);
            return None;
        };
        let rest = &text[colon + 1..];
        let Some(slash) = rest.find('/').filter(|&i| i > 0 && i + 1 < rest.len()) else {
            debug!(
                "Error parsing identifier: {}: ':<authority>/<identifier>' not found",
                text
            );
            return None;
        };

        let protocol: Protocol = text[..colon].parse().ok()?;

        let authority = format_component(&rest[..slash]);
        if authority.contains('\0') || !protocol.accepts_authority(&authority) {
            debug!("Rejected authority '{}' for protocol {}", authority, protocol);
            return None;
        }

        let identifier = format_component(&rest[slash + 1..]);
        if identifier.is_empty() || identifier.contains('\0') {
            return None;
        }

        Some(Self {
            protocol,
            authority,
            identifier,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// `authority/identifier`, the form registries key their records by.
    pub fn authority_path(&self) -> String {
        format!("{}/{}", self.authority, self.identifier)
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.protocol, self.authority, self.identifier)
    }
}

impl FromStr for GlobalId {
    type Err = PidError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        GlobalId::parse(s).ok_or_else(|| PidError::InvalidPid(s.to_string()))
    }
}

impl Serialize for GlobalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GlobalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// NAMESPACE
// =============================================================================

/// A validated protocol/authority pair that candidate identifiers are minted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    protocol: Protocol,
    authority: String,
}

impl Namespace {
    pub fn new(protocol: Protocol, authority: &str) -> Result<Self> {
        let authority = format_component(authority);
        if authority.contains('\0') || !protocol.accepts_authority(&authority) {
            return Err(PidError::InvalidAuthority {
                protocol: protocol.to_string(),
                authority,
            });
        }
        Ok(Self {
            protocol,
            authority,
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The global id for `identifier` within this namespace. The identifier is
    /// taken as generated; callers mint from clean prefixes and suffixes.
    pub fn global_id(&self, identifier: impl Into<String>) -> GlobalId {
        GlobalId {
            protocol: self.protocol,
            authority: self.authority.clone(),
            identifier: identifier.into(),
        }
    }
}

/// Strip whitespace, `;` and `'` from a raw authority or identifier segment.
pub fn format_component(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != ';' && *c != '\'')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_doi() {
        let pid = GlobalId::parse("doi:10.5072/FK2/ABC123").unwrap();
        assert_eq!(pid.protocol(), Protocol::Doi);
        assert_eq!(pid.authority(), "10.5072");
        assert_eq!(pid.identifier(), "FK2/ABC123");
        assert_eq!(pid.to_string(), "doi:10.5072/FK2/ABC123");
    }

    #[test]
    fn test_parse_handle_and_perma() {
        let hdl = GlobalId::parse("hdl:1902.1/XYZ").unwrap();
        assert_eq!(hdl.protocol(), Protocol::Handle);
        assert_eq!(hdl.authority(), "1902.1");

        let perma = GlobalId::parse("perma:LOCAL/abc").unwrap();
        assert_eq!(perma.protocol(), Protocol::Perma);
    }

    #[test]
    fn test_parse_strips_disallowed_characters() {
        let pid = GlobalId::parse("doi: 10.5072 /AB;C' 1").unwrap();
        assert_eq!(pid.authority(), "10.5072");
        assert_eq!(pid.identifier(), "ABC1");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(GlobalId::parse("").is_none());
        assert!(GlobalId::parse("10.5072/ABC").is_none());
        assert!(GlobalId::parse(":10.5072/ABC").is_none());
        assert!(GlobalId::parse("doi:10.5072").is_none());
        assert!(GlobalId::parse("doi:/ABC").is_none());
        assert!(GlobalId::parse("doi:10.5072/").is_none());
        assert!(GlobalId::parse("ark:10.5072/ABC").is_none());
        assert!(GlobalId::parse("doi:11.5072/ABC").is_none());
        assert!(GlobalId::parse("doi:10.abc/ABC").is_none());
        assert!(GlobalId::parse("doi:10.5072/AB\0C").is_none());
        assert!(GlobalId::parse("hdl:19\002/ABC").is_none());
    }

    #[test]
    fn test_from_str_error() {
        let err = "nope".parse::<GlobalId>().unwrap_err();
        assert!(matches!(err, PidError::InvalidPid(_)));
    }

    #[test]
    fn test_new_validates_authority() {
        assert!(GlobalId::new(Protocol::Doi, "10.5072", "FK2ABC").is_ok());
        assert!(matches!(
            GlobalId::new(Protocol::Doi, "5072", "FK2ABC"),
            Err(PidError::InvalidAuthority { .. })
        ));
        assert!(GlobalId::new(Protocol::Handle, "", "X").is_err());
    }

    #[test]
    fn test_format_component() {
        assert_eq!(format_component("  10.5072 "), "10.5072");
        assert_eq!(format_component("a;b'c"), "abc");
        assert_eq!(format_component("\tFK2\n"), "FK2");
    }

    #[test]
    fn test_serde_string_form() {
        let pid = GlobalId::parse("doi:10.5072/FK2ABC").unwrap();
        let json = serde_json::to_string(&pid).unwrap();
        assert_eq!(json, "\"doi:10.5072/FK2ABC\"");
        let back: GlobalId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pid);
    }

    proptest! {
        #[test]
        fn prop_parse_valid_triples(
            protocol in prop::sample::select(vec!["doi", "hdl", "perma"]),
            prefix in 1000u32..99999,
            identifier in "[A-Z0-9]{1,6}(/[A-Z0-9]{1,6})?",
        ) {
            let authority = format!("10.{}", prefix);
            let text = format!("{}:{}/{}", protocol, authority, identifier);
            let pid = GlobalId::parse(&text).unwrap();
            prop_assert_eq!(pid.protocol().as_str(), protocol);
            prop_assert_eq!(pid.authority(), authority.as_str());
            prop_assert_eq!(pid.identifier(), identifier.as_str());
        }

        #[test]
        fn prop_parse_without_colon_is_none(text in "[^:]*") {
            prop_assert!(GlobalId::parse(&text).is_none());
        }

        #[test]
        fn prop_parse_without_slash_after_colon_is_none(
            protocol in "[a-z]{1,5}",
            tail in "[^/]*",
        ) {
            let text = format!("{}:{}", protocol, tail);
            prop_assert!(GlobalId::parse(&text).is_none());
        }
    }
}
