//! Registration metadata
//!
//! Turns a [`ResearchObject`] into what a PID registry wants to see:
//!
//! - [`fields`]: the flat `datacite.*` / `_target` key-value form used for
//!   lightweight create/update calls
//! - [`datacite`]: the full DataCite XML document
//!
//! Both go through [`MetadataDocument`], a request-scoped view of the object
//! with every fallback already applied.

pub mod datacite;
pub mod fields;

pub use datacite::{render_xml, RegisteredMetadata, TemplateSlot};
pub use fields::{
    metadata_for_create, metadata_for_destroyed, metadata_for_target_url, metadata_for_update,
    target_url,
};

use crate::codec::{GlobalId, Protocol};
use crate::config::PidSettings;
use crate::error::{PidError, Result};
use crate::model::{Author, Contributor, ObjectKind, ResearchObject, NA_VALUE};

/// Marker registries accept for "value unavailable"
pub const UNAVAILABLE: &str = ":unav";

/// Publication year used when none is known; registries only accept four digits
pub const SENTINEL_YEAR: &str = "9999";

/// Title that replaces a destroyed or deaccessioned object's metadata
pub const REMOVED_TITLE: &str = "This item has been removed from publication";

/// `value`, or [`UNAVAILABLE`] when it is blank or the "not applicable" sentinel.
pub fn or_unavailable(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == NA_VALUE {
        UNAVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    HasPart,
    IsPartOf,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::HasPart => "HasPart",
            RelationType::IsPartOf => "IsPartOf",
        }
    }
}

/// A part/whole link between a dataset and one of its files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedIdentifier {
    pub relation: RelationType,
    pub target: GlobalId,
}

/// DataCite identifier type for a protocol.
pub fn identifier_type(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::Doi => "DOI",
        Protocol::Handle => "Handle",
        Protocol::Perma => "URL",
    }
}

impl RelatedIdentifier {
    /// DataCite `relatedIdentifierType` for the target's protocol.
    pub fn identifier_type(&self) -> &'static str {
        identifier_type(self.target.protocol())
    }
}

/// Intermediate, request-scoped form of an object's registration metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    /// `identifierType` attribute: DOI, Handle or URL
    pub identifier_type: &'static str,
    /// `authority/identifier`, without the protocol
    pub identifier: String,
    pub title: String,
    pub publisher: String,
    pub publication_year: Option<String>,
    pub authors: Vec<Author>,
    pub contacts: Vec<Contributor>,
    pub producers: Vec<Contributor>,
    pub description: String,
    pub related: Vec<RelatedIdentifier>,
}

impl MetadataDocument {
    /// Collect the document for `object`. Destroyed objects get the inert
    /// placeholder regardless of what they still carry.
    pub fn from_object(object: &ResearchObject, settings: &PidSettings) -> Result<Self> {
        let pid = object.global_id().ok_or(PidError::MissingAttribute {
            attribute: "identifier",
        })?;

        if object.is_destroyed() {
            return Ok(Self::destroyed(&pid));
        }

        let citation = object.citation_metadata();
        Ok(Self {
            identifier_type: identifier_type(pid.protocol()),
            identifier: pid.authority_path(),
            title: or_unavailable(&object.display_name),
            publisher: or_unavailable(&settings.publisher),
            publication_year: object.year_published_created(),
            authors: citation.authors.clone(),
            contacts: citation.contacts.clone(),
            producers: citation.producers.clone(),
            description: object.metadata.description.clone().unwrap_or_default(),
            related: related_identifiers(object)?,
        })
    }

    /// Placeholder document for a destroyed or deaccessioned object.
    pub fn destroyed(pid: &GlobalId) -> Self {
        Self {
            identifier_type: identifier_type(pid.protocol()),
            identifier: pid.authority_path(),
            title: REMOVED_TITLE.to_string(),
            publisher: UNAVAILABLE.to_string(),
            publication_year: Some(SENTINEL_YEAR.to_string()),
            authors: vec![Author::new(UNAVAILABLE)],
            contacts: Vec::new(),
            producers: Vec::new(),
            description: String::new(),
            related: Vec::new(),
        }
    }

    pub fn year_or_sentinel(&self) -> &str {
        self.publication_year.as_deref().unwrap_or(SENTINEL_YEAR)
    }

    pub fn to_xml(&self) -> Result<String> {
        render_xml(self)
    }
}

/// Dataset: one `HasPart` per file that already has a PID. File: one
/// `IsPartOf` pointing at the owning dataset.
fn related_identifiers(object: &ResearchObject) -> Result<Vec<RelatedIdentifier>> {
    match &object.kind {
        ObjectKind::Container { files } => Ok(files
            .iter()
            .filter_map(|file| file.pid.global_id())
            .map(|target| RelatedIdentifier {
                relation: RelationType::HasPart,
                target,
            })
            .collect()),
        ObjectKind::Leaf { owner } => {
            let target = owner.pid.global_id().ok_or(PidError::MissingAttribute {
                attribute: "owner identifier",
            })?;
            Ok(vec![RelatedIdentifier {
                relation: RelationType::IsPartOf,
                target,
            }])
        }
    }
}
