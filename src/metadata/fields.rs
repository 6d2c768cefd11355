//! Flat key-value registration metadata

use super::{or_unavailable, REMOVED_TITLE, SENTINEL_YEAR, UNAVAILABLE};
use crate::config::PidSettings;
use crate::error::{PidError, Result};
use crate::model::{ResearchObject, NA_VALUE};
use std::collections::BTreeMap;
use tracing::debug;

pub const CREATOR: &str = "datacite.creator";
pub const TITLE: &str = "datacite.title";
pub const PUBLISHER: &str = "datacite.publisher";
pub const PUBLICATION_YEAR: &str = "datacite.publicationyear";
pub const TARGET: &str = "_target";

pub type FieldMap = BTreeMap<String, String>;

/// Fields for registering a new identifier: the basic citation plus the
/// target URL the identifier should resolve to.
pub fn metadata_for_create(object: &ResearchObject, settings: &PidSettings) -> Result<FieldMap> {
    debug!("metadata_for_create: {}", object.display_name);
    let mut metadata = basic_metadata(object, settings);
    metadata.insert(TARGET.to_string(), target_url(object, settings)?);
    Ok(metadata)
}

/// Fields for updating an existing registration; the target is left alone.
pub fn metadata_for_update(object: &ResearchObject, settings: &PidSettings) -> FieldMap {
    basic_metadata(object, settings)
}

/// Only the target URL, for moving where an identifier resolves.
pub fn metadata_for_target_url(
    object: &ResearchObject,
    settings: &PidSettings,
) -> Result<FieldMap> {
    let mut metadata = FieldMap::new();
    metadata.insert(TARGET.to_string(), target_url(object, settings)?);
    Ok(metadata)
}

/// Placeholder fields for a destroyed or deaccessioned object.
pub fn metadata_for_destroyed() -> FieldMap {
    FieldMap::from([
        (CREATOR.to_string(), UNAVAILABLE.to_string()),
        (TITLE.to_string(), REMOVED_TITLE.to_string()),
        (PUBLISHER.to_string(), UNAVAILABLE.to_string()),
        (PUBLICATION_YEAR.to_string(), SENTINEL_YEAR.to_string()),
    ])
}

/// `site_url` + landing page path + global id.
pub fn target_url(object: &ResearchObject, settings: &PidSettings) -> Result<String> {
    let pid = object.global_id().ok_or(PidError::MissingAttribute {
        attribute: "identifier",
    })?;
    Ok(format!(
        "{}{}{}",
        settings.site_url.trim_end_matches('/'),
        object.target_path(),
        pid
    ))
}

fn basic_metadata(object: &ResearchObject, settings: &PidSettings) -> FieldMap {
    if object.is_destroyed() {
        return metadata_for_destroyed();
    }

    let authors = object.author_string();
    let creator = if authors.is_empty() || authors.contains(NA_VALUE) {
        UNAVAILABLE.to_string()
    } else {
        authors
    };

    FieldMap::from([
        (CREATOR.to_string(), creator),
        (TITLE.to_string(), or_unavailable(&object.display_name)),
        (PUBLISHER.to_string(), or_unavailable(&settings.publisher)),
        (
            PUBLICATION_YEAR.to_string(),
            object
                .year_published_created()
                .unwrap_or_else(|| SENTINEL_YEAR.to_string()),
        ),
    ])
}
