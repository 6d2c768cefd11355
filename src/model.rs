//! Research object model
//!
//! Datasets (containers) and files (leaves) share their descriptive fields and
//! differ only in the variant payload: a dataset lists its files, a file
//! carries a lookup snapshot of its owning dataset.

use crate::codec::{format_component, GlobalId, Protocol};
use crate::error::{PidError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The application's "not applicable" sentinel for descriptive fields
pub const NA_VALUE: &str = "N/A";

// =============================================================================
// PID ASSIGNMENT
// =============================================================================

/// Identifier-assignment state of an object. Each field stays `None` until
/// the generator (or a legacy import) fills it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidAssignment {
    pub protocol: Option<String>,
    pub authority: Option<String>,
    pub identifier: Option<String>,
}

impl PidAssignment {
    pub fn from_global_id(pid: &GlobalId) -> Self {
        Self {
            protocol: Some(pid.protocol().to_string()),
            authority: Some(pid.authority().to_string()),
            identifier: Some(pid.identifier().to_string()),
        }
    }

    /// The full global id, if all three parts are assigned and valid.
    ///
    /// Stored components are taken as they are: one that would change under
    /// [`format_component`] yields `None` rather than a different PID.
    pub fn global_id(&self) -> Option<GlobalId> {
        let protocol: Protocol = self.protocol.as_deref()?.parse().ok()?;
        let authority = self.authority.as_deref()?;
        let identifier = self.identifier.as_deref()?;
        if format_component(authority) != authority || format_component(identifier) != identifier {
            return None;
        }
        GlobalId::new(protocol, authority, identifier).ok()
    }

    pub fn has_identifier(&self) -> bool {
        self.identifier.as_deref().is_some_and(|id| !id.is_empty())
    }
}

// =============================================================================
// PEOPLE
// =============================================================================

/// Name-identifier schemes the registry understands for creators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorIdScheme {
    Orcid,
    Isni,
    Lcna,
}

impl AuthorIdScheme {
    pub fn name(&self) -> &'static str {
        match self {
            AuthorIdScheme::Orcid => "ORCID",
            AuthorIdScheme::Isni => "ISNI",
            AuthorIdScheme::Lcna => "LCNA",
        }
    }

    pub fn scheme_uri(&self) -> &'static str {
        match self {
            AuthorIdScheme::Orcid => "https://orcid.org/",
            AuthorIdScheme::Isni => "http://isni.org/isni/",
            AuthorIdScheme::Lcna => "http://id.loc.gov/authorities/names/",
        }
    }
}

impl fmt::Display for AuthorIdScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AuthorIdScheme {
    type Err = PidError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ORCID" => Ok(AuthorIdScheme::Orcid),
            "ISNI" => Ok(AuthorIdScheme::Isni),
            "LCNA" => Ok(AuthorIdScheme::Lcna),
            other => Err(PidError::Config(format!(
                "Unknown author identifier scheme '{}'. Valid values: ORCID, ISNI, LCNA",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub id_scheme: Option<AuthorIdScheme>,
    #[serde(default)]
    pub id_value: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, scheme: AuthorIdScheme, value: impl Into<String>) -> Self {
        self.id_scheme = Some(scheme);
        self.id_value = Some(value.into());
        self
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }
}

/// A dataset contact or producer: a name plus an optional affiliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    #[serde(default)]
    pub affiliation: Option<String>,
}

impl Contributor {
    pub fn new(name: impl Into<String>, affiliation: Option<&str>) -> Self {
        Self {
            name: name.into(),
            affiliation: affiliation.map(str::to_string),
        }
    }
}

/// Descriptive fields shared by datasets and the owner snapshot on files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptiveMetadata {
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub contacts: Vec<Contributor>,
    #[serde(default)]
    pub producers: Vec<Contributor>,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// RESEARCH OBJECTS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectState {
    #[default]
    Active,
    /// Destroyed or deaccessioned; metadata is replaced with a placeholder
    Destroyed,
}

/// What a dataset knows about one of its files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub display_name: String,
    #[serde(default)]
    pub pid: PidAssignment,
}

/// Lookup snapshot of the dataset that owns a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    #[serde(default)]
    pub pid: PidAssignment,
    #[serde(default)]
    pub metadata: DescriptiveMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    Container {
        #[serde(default)]
        files: Vec<FileSummary>,
    },
    Leaf {
        owner: OwnerRef,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchObject {
    #[serde(default)]
    pub pid: PidAssignment,
    pub display_name: String,
    #[serde(default)]
    pub metadata: DescriptiveMetadata,
    #[serde(default)]
    pub published_on: Option<NaiveDate>,
    #[serde(default)]
    pub created_on: Option<NaiveDate>,
    #[serde(default)]
    pub state: ObjectState,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

impl ResearchObject {
    /// A new dataset with no files and no identifier.
    pub fn dataset(display_name: impl Into<String>) -> Self {
        Self {
            pid: PidAssignment::default(),
            display_name: display_name.into(),
            metadata: DescriptiveMetadata::default(),
            published_on: None,
            created_on: None,
            state: ObjectState::Active,
            kind: ObjectKind::Container { files: Vec::new() },
        }
    }

    /// A new file owned by `owner`. The owner must be a dataset.
    pub fn file(display_name: impl Into<String>, owner: &ResearchObject) -> Result<Self> {
        if !owner.is_container() {
            return Err(PidError::Config(format!(
                "'{}' is a file and cannot own other files",
                owner.display_name
            )));
        }
        Ok(Self {
            pid: PidAssignment::default(),
            display_name: display_name.into(),
            metadata: DescriptiveMetadata::default(),
            published_on: None,
            created_on: None,
            state: ObjectState::Active,
            kind: ObjectKind::Leaf {
                owner: OwnerRef {
                    pid: owner.pid.clone(),
                    metadata: owner.metadata.clone(),
                },
            },
        })
    }

    /// Record `file` in this dataset's file list. No-op for files.
    pub fn attach_file(&mut self, file: &ResearchObject) {
        if let ObjectKind::Container { files } = &mut self.kind {
            files.push(FileSummary {
                display_name: file.display_name.clone(),
                pid: file.pid.clone(),
            });
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, ObjectKind::Container { .. })
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ObjectState::Destroyed
    }

    pub fn global_id(&self) -> Option<GlobalId> {
        self.pid.global_id()
    }

    /// The owner snapshot for files, `None` for datasets.
    pub fn owner(&self) -> Option<&OwnerRef> {
        match &self.kind {
            ObjectKind::Leaf { owner } => Some(owner),
            ObjectKind::Container { .. } => None,
        }
    }

    /// Authors, contacts and producers that describe this object: a dataset's
    /// own, or the owning dataset's for a file.
    pub fn citation_metadata(&self) -> &DescriptiveMetadata {
        match &self.kind {
            ObjectKind::Container { .. } => &self.metadata,
            ObjectKind::Leaf { owner } => &owner.metadata,
        }
    }

    /// Year of publication, or of creation for unpublished objects.
    pub fn year_published_created(&self) -> Option<String> {
        self.published_on
            .or(self.created_on)
            .map(|date| date.year().to_string())
    }

    /// `"; "`-joined author names.
    pub fn author_string(&self) -> String {
        self.citation_metadata()
            .authors
            .iter()
            .map(|a| a.name.trim())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Landing-page path the global id is appended to when building a target URL.
    pub fn target_path(&self) -> &'static str {
        match self.kind {
            ObjectKind::Container { .. } => "/dataset.xhtml?persistentId=",
            ObjectKind::Leaf { .. } => "/file.xhtml?persistentId=",
        }
    }
}
