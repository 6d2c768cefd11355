//! PID-MINT - Persistent identifier minting for research objects
//!
//! Assigns `protocol:authority/identifier` PIDs to datasets and their files
//! and builds the metadata a PID registry needs to register them.
//!
//! ## Call chain
//! Caller -> IdentifierGenerator (strategy loop) -> UniquenessOracle
//! (local store, then registry) -> identifier written onto the object ->
//! MetadataDocument -> DataCite XML / flat field map
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pid_mint::{
//!     IdentifierGenerator, MemoryStore, MetadataDocument, NoRemoteRegistry, PidSettings,
//!     ResearchObject, UniquenessOracle,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> pid_mint::Result<()> {
//! let settings = PidSettings::default();
//! let oracle = UniquenessOracle::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(NoRemoteRegistry),
//!     settings.registry_timeout(),
//! );
//! let generator = IdentifierGenerator::new(oracle);
//!
//! let mut dataset = ResearchObject::dataset("Household Survey 2024");
//! let pid = generator.generate_identifier(&mut dataset, &settings).await?;
//! let xml = MetadataDocument::from_object(&dataset, &settings)?.to_xml()?;
//! println!("{pid}\n{xml}");
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Identifier strings and settings
pub mod codec;
pub mod config;

// Research objects
pub mod model;

// Collaborators: local object store and remote registry
pub mod registry;
pub mod store;
pub mod store_memory;

// Minting
pub mod generator;
pub mod uniqueness;

// Registration metadata
pub mod metadata;

pub use codec::{format_component, GlobalId, Namespace, Protocol};
pub use config::{FilePidFormat, GenerationStyle, PidSettings};
pub use error::{PidError, Result};
pub use generator::{IdentifierGenerator, RandomTokens, TokenSource};
pub use metadata::{MetadataDocument, RegisteredMetadata};
pub use model::{
    Author, AuthorIdScheme, Contributor, DescriptiveMetadata, ObjectKind, ObjectState,
    PidAssignment, ResearchObject,
};
pub use registry::{DataCiteClient, HandleClient, NoRemoteRegistry, RegistryClient};
pub use store::ObjectStore;
pub use store_memory::MemoryStore;
pub use uniqueness::UniquenessOracle;
