//! Identifier generator
//!
//! Produces candidate identifiers under the configured strategy and asks the
//! [`UniquenessOracle`] about each one until a free candidate turns up.
//!
//! ## Strategies
//!
//! ```text
//! random-string      prefix + 6 uppercase alphanumerics      retry forever
//! stored-procedure   prefix + store counter value            counter missing -> error
//!   (dependent file) <dataset id>/ + 1, 2, 3, ...            retry forever
//! ```
//!
//! Nothing is reserved: the identifier is free when it is returned, and the
//! caller's persistence layer must reject a concurrent duplicate.

use crate::codec::{GlobalId, Namespace, Protocol};
use crate::config::{FilePidFormat, GenerationStyle, PidSettings};
use crate::error::{PidError, Result};
use crate::model::{ObjectKind, ResearchObject};
use crate::uniqueness::UniquenessOracle;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Length of random-string identifier suffixes
pub const RANDOM_SUFFIX_LEN: usize = 6;

/// Source of random identifier suffixes
pub trait TokenSource: Send + Sync {
    fn next_token(&self, len: usize) -> String;
}

/// Thread-local RNG, uppercased alphanumerics
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn next_token(&self, len: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect::<String>()
            .to_uppercase()
    }
}

pub struct IdentifierGenerator {
    oracle: UniquenessOracle,
    tokens: Arc<dyn TokenSource>,
}

impl IdentifierGenerator {
    pub fn new(oracle: UniquenessOracle) -> Self {
        Self::with_tokens(oracle, Arc::new(RandomTokens))
    }

    pub fn with_tokens(oracle: UniquenessOracle, tokens: Arc<dyn TokenSource>) -> Self {
        Self { oracle, tokens }
    }

    /// Mint an identifier for `object` and write it back.
    ///
    /// Protocol and authority already on the object (a legacy PID from another
    /// authority) are kept; missing ones come from `settings`. An object that
    /// already has an identifier is not re-minted.
    pub async fn generate_identifier(
        &self,
        object: &mut ResearchObject,
        settings: &PidSettings,
    ) -> Result<GlobalId> {
        let protocol = match object.pid.protocol.as_deref() {
            Some(protocol) => protocol.parse::<Protocol>()?,
            None => settings.protocol,
        };
        let authority = object
            .pid
            .authority
            .clone()
            .unwrap_or_else(|| settings.authority.clone());
        let namespace = Namespace::new(protocol, &authority)?;

        let identifier = match object.pid.identifier.clone().filter(|id| !id.is_empty()) {
            Some(existing) => {
                debug!(
                    "'{}' already has identifier {}, not minting",
                    object.display_name, existing
                );
                existing
            }
            None => {
                let minted = self.assign(object, &namespace, settings).await?;
                object.pid.identifier = Some(minted.clone());
                minted
            }
        };

        object
            .pid
            .protocol
            .get_or_insert_with(|| namespace.protocol().to_string());
        object
            .pid
            .authority
            .get_or_insert_with(|| namespace.authority().to_string());

        let pid = namespace.global_id(identifier);
        info!("Assigned {} to '{}'", pid, object.display_name);
        Ok(pid)
    }

    /// Produce a free identifier for `object` within `namespace`.
    pub async fn assign(
        &self,
        object: &ResearchObject,
        namespace: &Namespace,
        settings: &PidSettings,
    ) -> Result<String> {
        let prefix = Self::prefix_for(object, settings)?;
        let dependent_file = !object.is_container()
            && settings.file_pid_format == FilePidFormat::Dependent;

        match settings.generation_style {
            GenerationStyle::RandomString => self.random_string(namespace, &prefix).await,
            GenerationStyle::StoredProcedure if dependent_file => {
                self.dependent_counter(namespace, &prefix).await
            }
            GenerationStyle::StoredProcedure => self.stored_procedure(namespace, &prefix).await,
        }
    }

    /// Datasets and independent files get the shoulder; dependent files are
    /// scoped under their dataset's identifier.
    pub fn prefix_for(object: &ResearchObject, settings: &PidSettings) -> Result<String> {
        match &object.kind {
            ObjectKind::Container { .. } => Ok(settings.shoulder.clone()),
            ObjectKind::Leaf { owner } => match settings.file_pid_format {
                FilePidFormat::Independent => Ok(settings.shoulder.clone()),
                FilePidFormat::Dependent => owner
                    .pid
                    .identifier
                    .as_deref()
                    .filter(|id| !id.is_empty())
                    .map(|id| format!("{}/", id))
                    .ok_or(PidError::MissingOwnerIdentifier),
            },
        }
    }

    // No attempt cap: a 36^6 suffix space per prefix makes a long run of
    // collisions implausible, not impossible.
    async fn random_string(&self, namespace: &Namespace, prefix: &str) -> Result<String> {
        loop {
            let identifier = format!("{}{}", prefix, self.tokens.next_token(RANDOM_SUFFIX_LEN));
            if self.oracle.is_unique(&namespace.global_id(&identifier)).await? {
                return Ok(identifier);
            }
            debug!("Random candidate {} taken, retrying", identifier);
        }
    }

    async fn stored_procedure(&self, namespace: &Namespace, prefix: &str) -> Result<String> {
        loop {
            let value = self
                .oracle
                .store()
                .next_counter_value()
                .await
                .map_err(PidError::Store)?;
            let Some(value) = value else {
                error!("Identifier counter is not provisioned in the object store");
                return Err(PidError::CounterUnavailable);
            };
            let identifier = format!("{}{}", prefix, value);
            if self.oracle.is_unique(&namespace.global_id(&identifier)).await? {
                return Ok(identifier);
            }
            debug!("Counter candidate {} taken, retrying", identifier);
        }
    }

    async fn dependent_counter(&self, namespace: &Namespace, prefix: &str) -> Result<String> {
        // TODO: ask the store for the highest taken suffix under `prefix`; this
        // walk costs one lookup per existing file in the dataset.
        let mut n: u64 = 0;
        loop {
            n += 1;
            let identifier = format!("{}{}", prefix, n);
            if self.oracle.is_unique(&namespace.global_id(&identifier)).await? {
                return Ok(identifier);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NoRemoteRegistry;
    use crate::store_memory::MemoryStore;
    use regex::Regex;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedTokens(Mutex<VecDeque<&'static str>>);

    impl ScriptedTokens {
        fn new(tokens: &[&'static str]) -> Arc<Self> {
            Arc::new(Self(Mutex::new(tokens.iter().copied().collect())))
        }
    }

    impl TokenSource for ScriptedTokens {
        fn next_token(&self, _len: usize) -> String {
            self.0.lock().unwrap().pop_front().unwrap().to_string()
        }
    }

    fn doi(identifier: &str) -> GlobalId {
        GlobalId::new(Protocol::Doi, "10.5072", identifier).unwrap()
    }

    fn namespace() -> Namespace {
        Namespace::new(Protocol::Doi, "10.5072").unwrap()
    }

    fn generator(store: Arc<MemoryStore>, tokens: Option<Arc<ScriptedTokens>>) -> IdentifierGenerator {
        let oracle =
            UniquenessOracle::new(store, Arc::new(NoRemoteRegistry), Duration::from_millis(50));
        match tokens {
            Some(tokens) => IdentifierGenerator::with_tokens(oracle, tokens),
            None => IdentifierGenerator::new(oracle),
        }
    }

    fn settings(style: GenerationStyle, format: FilePidFormat) -> PidSettings {
        PidSettings {
            generation_style: style,
            file_pid_format: format,
            ..PidSettings::default()
        }
    }

    fn dataset_with_id(identifier: &str) -> ResearchObject {
        let mut dataset = ResearchObject::dataset("Survey");
        dataset.pid = crate::model::PidAssignment::from_global_id(&doi(identifier));
        dataset
    }

    #[test]
    fn test_random_tokens_shape() {
        let re = Regex::new(r"^[A-Z0-9]{6}$").unwrap();
        for _ in 0..100 {
            assert!(re.is_match(&RandomTokens.next_token(RANDOM_SUFFIX_LEN)));
        }
    }

    #[tokio::test]
    async fn test_random_string_dataset() {
        let generator = generator(Arc::new(MemoryStore::new()), None);
        let dataset = ResearchObject::dataset("Survey");
        let settings = settings(GenerationStyle::RandomString, FilePidFormat::Dependent);

        let id = generator
            .assign(&dataset, &namespace(), &settings)
            .await
            .unwrap();
        assert!(Regex::new(r"^FK2/[A-Z0-9]{6}$").unwrap().is_match(&id));
    }

    #[tokio::test]
    async fn test_random_string_retries_collisions() {
        let store = Arc::new(MemoryStore::new());
        store.insert(doi("FK2/AAAAAA"));
        store.insert(doi("FK2/BBBBBB"));
        let generator = generator(
            store,
            Some(ScriptedTokens::new(&["AAAAAA", "BBBBBB", "CCCCCC"])),
        );
        let settings = settings(GenerationStyle::RandomString, FilePidFormat::Dependent);

        let id = generator
            .assign(&ResearchObject::dataset("Survey"), &namespace(), &settings)
            .await
            .unwrap();
        assert_eq!(id, "FK2/CCCCCC");
    }

    #[tokio::test]
    async fn test_random_string_dependent_file_uses_owner_prefix() {
        let dataset = dataset_with_id("FK2/ABC123");
        let file = ResearchObject::file("a.csv", &dataset).unwrap();
        let generator = generator(Arc::new(MemoryStore::new()), Some(ScriptedTokens::new(&["QWERTY"])));
        let settings = settings(GenerationStyle::RandomString, FilePidFormat::Dependent);

        let id = generator.assign(&file, &namespace(), &settings).await.unwrap();
        assert_eq!(id, "FK2/ABC123/QWERTY");
    }

    #[tokio::test]
    async fn test_independent_file_uses_shoulder() {
        let dataset = dataset_with_id("FK2/ABC123");
        let file = ResearchObject::file("a.csv", &dataset).unwrap();
        let generator = generator(Arc::new(MemoryStore::new()), Some(ScriptedTokens::new(&["QWERTY"])));
        let settings = settings(GenerationStyle::RandomString, FilePidFormat::Independent);

        let id = generator.assign(&file, &namespace(), &settings).await.unwrap();
        assert_eq!(id, "FK2/QWERTY");
    }

    #[tokio::test]
    async fn test_stored_procedure_skips_taken_values() {
        let store = Arc::new(MemoryStore::with_counter(7));
        store.insert(doi("FK2/7"));
        let generator = generator(store, None);
        let settings = settings(GenerationStyle::StoredProcedure, FilePidFormat::Dependent);

        let id = generator
            .assign(&ResearchObject::dataset("Survey"), &namespace(), &settings)
            .await
            .unwrap();
        assert_eq!(id, "FK2/8");
    }

    #[tokio::test]
    async fn test_stored_procedure_without_counter_fails_fast() {
        let generator = generator(Arc::new(MemoryStore::new()), None);
        let settings = settings(GenerationStyle::StoredProcedure, FilePidFormat::Independent);
        let dataset = dataset_with_id("FK2/ABC123");
        let file = ResearchObject::file("a.csv", &dataset).unwrap();

        let err = generator
            .assign(&file, &namespace(), &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, PidError::CounterUnavailable));
    }

    #[tokio::test]
    async fn test_dependent_counter_counts_from_one() {
        let store = Arc::new(MemoryStore::new());
        store.insert(doi("FK2/ABC123/1"));
        store.insert(doi("FK2/ABC123/2"));
        let generator = generator(store.clone(), None);
        let settings = settings(GenerationStyle::StoredProcedure, FilePidFormat::Dependent);
        let dataset = dataset_with_id("FK2/ABC123");

        let mut minted = Vec::new();
        for name in ["a.csv", "b.csv"] {
            let file = ResearchObject::file(name, &dataset).unwrap();
            let id = generator.assign(&file, &namespace(), &settings).await.unwrap();
            store.insert(doi(&id));
            minted.push(id);
        }
        assert_eq!(minted, vec!["FK2/ABC123/3", "FK2/ABC123/4"]);
    }

    #[tokio::test]
    async fn test_dependent_file_without_owner_identifier() {
        let dataset = ResearchObject::dataset("Survey");
        let file = ResearchObject::file("a.csv", &dataset).unwrap();
        let generator = generator(Arc::new(MemoryStore::new()), None);
        let settings = settings(GenerationStyle::StoredProcedure, FilePidFormat::Dependent);

        let err = generator
            .assign(&file, &namespace(), &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, PidError::MissingOwnerIdentifier));
    }

    #[tokio::test]
    async fn test_generate_identifier_writes_back_defaults() {
        let generator = generator(Arc::new(MemoryStore::new()), Some(ScriptedTokens::new(&["ZXCVBN"])));
        let mut dataset = ResearchObject::dataset("Survey");

        let pid = generator
            .generate_identifier(&mut dataset, &PidSettings::default())
            .await
            .unwrap();
        assert_eq!(pid.to_string(), "doi:10.5072/FK2/ZXCVBN");
        assert_eq!(dataset.pid.protocol.as_deref(), Some("doi"));
        assert_eq!(dataset.pid.authority.as_deref(), Some("10.5072"));
        assert_eq!(dataset.pid.identifier.as_deref(), Some("FK2/ZXCVBN"));
        assert_eq!(dataset.global_id(), Some(pid));
    }

    #[tokio::test]
    async fn test_generate_identifier_keeps_legacy_authority() {
        let generator = generator(Arc::new(MemoryStore::new()), Some(ScriptedTokens::new(&["LEGACY"])));
        let mut dataset = ResearchObject::dataset("Survey");
        dataset.pid.protocol = Some("doi".to_string());
        dataset.pid.authority = Some("10.9999".to_string());

        let pid = generator
            .generate_identifier(&mut dataset, &PidSettings::default())
            .await
            .unwrap();
        assert_eq!(pid.authority(), "10.9999");
        assert_eq!(dataset.pid.authority.as_deref(), Some("10.9999"));
    }

    #[tokio::test]
    async fn test_generate_identifier_does_not_remint() {
        let generator = generator(Arc::new(MemoryStore::new()), Some(ScriptedTokens::new(&[])));
        let mut dataset = dataset_with_id("FK2/KEEPME");

        let pid = generator
            .generate_identifier(&mut dataset, &PidSettings::default())
            .await
            .unwrap();
        assert_eq!(pid.identifier(), "FK2/KEEPME");
    }

    #[tokio::test]
    async fn test_generate_identifier_rejects_bad_legacy_protocol() {
        let generator = generator(Arc::new(MemoryStore::new()), None);
        let mut dataset = ResearchObject::dataset("Survey");
        dataset.pid.protocol = Some("ark".to_string());

        let err = generator
            .generate_identifier(&mut dataset, &PidSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PidError::UnsupportedProtocol(_)));
        assert!(dataset.pid.identifier.is_none());
    }
}
