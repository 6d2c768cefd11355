//! DataCite XML document
//!
//! The document layout is a fixed template whose placeholder tokens are
//! treated as named slots. The template is split into literal chunks and
//! slots once; rendering walks that list and writes each slot's content
//! (escaped by quick-xml) exactly once. Rendered content is never scanned
//! for tokens, so user text that happens to look like a placeholder stays
//! text.

use super::{MetadataDocument, RelatedIdentifier};
use crate::error::{PidError, Result};
use crate::model::{Author, Contributor};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;
use std::sync::LazyLock;
use tracing::debug;

const TEMPLATE: &str = include_str!("datacite_metadata_template.xml");

fn xml_err(error: impl Display) -> PidError {
    PidError::Xml(error.to_string())
}

// =============================================================================
// TEMPLATE SLOTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSlot {
    IdentifierType,
    Identifier,
    Title,
    Publisher,
    PublisherYear,
    Description,
    Creators,
    Contributors,
    RelatedIdentifiers,
}

impl TemplateSlot {
    pub const ALL: [TemplateSlot; 9] = [
        TemplateSlot::IdentifierType,
        TemplateSlot::Identifier,
        TemplateSlot::Title,
        TemplateSlot::Publisher,
        TemplateSlot::PublisherYear,
        TemplateSlot::Description,
        TemplateSlot::Creators,
        TemplateSlot::Contributors,
        TemplateSlot::RelatedIdentifiers,
    ];

    /// Placeholder token as it appears in the template.
    pub fn token(&self) -> &'static str {
        match self {
            TemplateSlot::IdentifierType => "${identifierType}",
            TemplateSlot::Identifier => "${identifier}",
            TemplateSlot::Title => "${title}",
            TemplateSlot::Publisher => "${publisher}",
            TemplateSlot::PublisherYear => "${publisherYear}",
            TemplateSlot::Description => "${description}",
            TemplateSlot::Creators => "${creators}",
            // Deployed templates spell this one differently.
            TemplateSlot::Contributors => "{$contributors}",
            TemplateSlot::RelatedIdentifiers => "${relatedIdentifiers}",
        }
    }
}

/// The bundled template, for callers that want to inspect it.
pub fn template() -> &'static str {
    TEMPLATE
}

/// A piece of the template: literal markup or a slot to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk {
    Literal(&'static str),
    Slot(TemplateSlot),
}

static CHUNKS: LazyLock<Vec<Chunk>> = LazyLock::new(|| split_template(TEMPLATE));

/// Split `template` at every slot token, leftmost first.
fn split_template(template: &'static str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut rest = template;

    loop {
        let next = TemplateSlot::ALL
            .iter()
            .filter_map(|slot| rest.find(slot.token()).map(|at| (at, *slot)))
            .min_by_key(|(at, _)| *at);

        let Some((at, slot)) = next else {
            if !rest.is_empty() {
                chunks.push(Chunk::Literal(rest));
            }
            return chunks;
        };

        if at > 0 {
            chunks.push(Chunk::Literal(&rest[..at]));
        }
        chunks.push(Chunk::Slot(slot));
        rest = &rest[at + slot.token().len()..];
    }
}

// =============================================================================
// RENDERING
// =============================================================================

/// Render `doc` into the DataCite XML document.
pub fn render_xml(doc: &MetadataDocument) -> Result<String> {
    let mut xml = String::with_capacity(TEMPLATE.len() + 512);
    for chunk in CHUNKS.iter() {
        match chunk {
            Chunk::Literal(text) => xml.push_str(text),
            Chunk::Slot(slot) => xml.push_str(&slot_content(*slot, doc)?),
        }
    }

    debug!("XML to send to DataCite: {}", xml);
    Ok(xml)
}

fn slot_content(slot: TemplateSlot, doc: &MetadataDocument) -> Result<String> {
    match slot {
        TemplateSlot::IdentifierType => Ok(escape_text(doc.identifier_type)),
        TemplateSlot::Identifier => Ok(escape_text(doc.identifier.trim())),
        TemplateSlot::Title => Ok(escape_text(&doc.title)),
        TemplateSlot::Publisher => Ok(escape_text(&doc.publisher)),
        TemplateSlot::PublisherYear => Ok(escape_text(doc.year_or_sentinel())),
        TemplateSlot::Description => Ok(escape_text(&doc.description)),
        TemplateSlot::Creators => fragment(|w| write_creators(w, &doc.authors)),
        TemplateSlot::Contributors => {
            fragment(|w| write_contributors(w, &doc.contacts, &doc.producers))
        }
        TemplateSlot::RelatedIdentifiers => fragment(|w| write_related(w, &doc.related)),
    }
}

fn escape_text(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

type XmlWriter = Writer<Vec<u8>>;

fn fragment<F>(build: F) -> Result<String>
where
    F: FnOnce(&mut XmlWriter) -> Result<()>,
{
    let mut writer = Writer::new(Vec::new());
    build(&mut writer)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

fn start(writer: &mut XmlWriter, element: BytesStart<'_>) -> Result<()> {
    writer.write_event(Event::Start(element)).map_err(xml_err)
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)
}

fn text_element(writer: &mut XmlWriter, element: BytesStart<'_>, text: &str) -> Result<()> {
    let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();
    start(writer, element)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    end(writer, &name)
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// One `<creator>` per author. A name identifier is only written when the
/// scheme, the value and an affiliation are all present.
fn write_creators(writer: &mut XmlWriter, authors: &[Author]) -> Result<()> {
    for author in authors {
        start(writer, BytesStart::new("creator"))?;
        text_element(writer, BytesStart::new("creatorName"), &author.name)?;

        let affiliation = non_empty(author.affiliation.as_ref());
        if let (Some(scheme), Some(value), Some(_)) =
            (author.id_scheme, non_empty(author.id_value.as_ref()), affiliation)
        {
            let mut element = BytesStart::new("nameIdentifier");
            element.push_attribute(("schemeURI", scheme.scheme_uri()));
            element.push_attribute(("nameIdentifierScheme", scheme.name()));
            text_element(writer, element, value)?;
        }
        if let Some(affiliation) = affiliation {
            text_element(writer, BytesStart::new("affiliation"), affiliation)?;
        }

        end(writer, "creator")?;
    }
    Ok(())
}

fn write_contributor(writer: &mut XmlWriter, role: &str, person: &Contributor) -> Result<()> {
    let mut element = BytesStart::new("contributor");
    element.push_attribute(("contributorType", role));
    start(writer, element)?;
    text_element(writer, BytesStart::new("contributorName"), &person.name)?;
    if let Some(affiliation) = non_empty(person.affiliation.as_ref()) {
        text_element(writer, BytesStart::new("affiliation"), affiliation)?;
    }
    end(writer, "contributor")
}

/// Contacts with a name become `ContactPerson`s; every producer becomes a
/// `Producer`.
fn write_contributors(
    writer: &mut XmlWriter,
    contacts: &[Contributor],
    producers: &[Contributor],
) -> Result<()> {
    for contact in contacts.iter().filter(|c| !c.name.trim().is_empty()) {
        write_contributor(writer, "ContactPerson", contact)?;
    }
    for producer in producers {
        write_contributor(writer, "Producer", producer)?;
    }
    Ok(())
}

/// The `<relatedIdentifiers>` wrapper is omitted entirely when there are no
/// links.
fn write_related(writer: &mut XmlWriter, related: &[RelatedIdentifier]) -> Result<()> {
    if related.is_empty() {
        return Ok(());
    }
    start(writer, BytesStart::new("relatedIdentifiers"))?;
    for link in related {
        let mut element = BytesStart::new("relatedIdentifier");
        element.push_attribute(("relatedIdentifierType", link.identifier_type()));
        element.push_attribute(("relationType", link.relation.as_str()));
        text_element(writer, element, &link.target.to_string())?;
    }
    end(writer, "relatedIdentifiers")
}

// =============================================================================
// READING
// =============================================================================

/// The citation fields of a document already held by the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredMetadata {
    pub identifier: Option<String>,
    pub creators: Vec<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<String>,
}

impl RegisteredMetadata {
    /// Pull identifier, creator names, title, publisher and publication year
    /// out of a DataCite document. Only the first occurrence of each
    /// single-valued element is kept.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut metadata = Self::default();
        let mut current: Option<String> = None;

        loop {
            match reader.read_event().map_err(xml_err)? {
                Event::Start(e) => {
                    current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                Event::End(_) => current = None,
                Event::Text(e) => {
                    let text = e.unescape().map_err(xml_err)?;
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    match current.as_deref() {
                        Some("identifier") => set_once(&mut metadata.identifier, text),
                        Some("creatorName") => metadata.creators.push(text.to_string()),
                        Some("title") => set_once(&mut metadata.title, text),
                        Some("publisher") => set_once(&mut metadata.publisher, text),
                        Some("publicationYear") => set_once(&mut metadata.publication_year, text),
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(metadata)
    }
}

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}
