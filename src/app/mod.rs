//! Wiring from configuration to a ready [`GroupService`].

use std::sync::Arc;

use crate::adapters::file_store::{load_seed, FileStore};
use crate::adapters::memory_store::MemoryStore;
use crate::adapters::roster::RosterSource;
use crate::adapters::spond::SpondSource;
use crate::config::toml_config::{AppConfig, SourceKind, StoreKind};
use crate::core::service::GroupService;
use crate::domain::model::{ATTENDEES_KEY, GROUPS_KEY};
use crate::domain::ports::{AttendeeSource, Store};
use crate::utils::error::{GroupsError, Result};
use crate::utils::validation::validate_required_field;

/// Seeds are read once here, so a bad seed file fails startup instead of a request.
pub fn build_store(config: &AppConfig) -> Result<Arc<dyn Store>> {
    let mut seeds = Vec::new();
    if let Some(path) = &config.store.attendees_seed {
        seeds.push((ATTENDEES_KEY, load_seed(path)?));
    }
    if let Some(path) = &config.store.groups_seed {
        seeds.push((GROUPS_KEY, load_seed(path)?));
    }

    let store: Arc<dyn Store> = match config.store.kind {
        StoreKind::Memory => {
            let store = seeds
                .into_iter()
                .fold(MemoryStore::new(), |store, (key, values)| store.with_seed(key, values));
            Arc::new(store)
        }
        StoreKind::File => {
            let directory = validate_required_field("store.directory", &config.store.directory)?;
            let store = seeds
                .into_iter()
                .fold(FileStore::new(directory), |store, (key, values)| {
                    store.with_seed(key, values)
                });
            Arc::new(store)
        }
    };

    tracing::info!("💾 Using {:?} store", config.store.kind);
    Ok(store)
}

pub fn build_source(config: &AppConfig) -> Result<Arc<dyn AttendeeSource>> {
    let source: Arc<dyn AttendeeSource> = match config.source.kind {
        SourceKind::Spond => {
            let spond = config.spond.as_ref().ok_or_else(|| GroupsError::MissingConfigError {
                field: "spond".to_string(),
            })?;
            Arc::new(SpondSource::new(spond, config.fetch_timeout())?)
        }
        SourceKind::Roster => {
            let roster = validate_required_field("roster", &config.roster)?;
            Arc::new(RosterSource::new(&roster.directory))
        }
    };

    tracing::info!("📡 Using {} attendee source", source.name());
    Ok(source)
}

pub fn build_service(config: &AppConfig) -> Result<GroupService> {
    Ok(GroupService::new(
        build_store(config)?,
        build_source(config)?,
        config.fetch_timeout(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_with_seed() {
        let temp_dir = TempDir::new().unwrap();
        let seed = temp_dir.path().join("attendees.json");
        std::fs::write(&seed, r#"["Alice", "Bob"]"#).unwrap();

        let mut config = AppConfig::default();
        config.store.attendees_seed = Some(seed.to_str().unwrap().to_string());

        let store = build_store(&config).unwrap();
        assert_eq!(store.get(ATTENDEES_KEY).await.unwrap().len(), 2);
        assert!(store.get(GROUPS_KEY).await.unwrap().is_empty());
    }

    #[test]
    fn test_missing_seed_fails_startup() {
        let mut config = AppConfig::default();
        config.store.groups_seed = Some("/no/such/groups.json".to_string());

        assert!(matches!(
            build_store(&config),
            Err(GroupsError::StorageError { .. })
        ));
    }

    #[test]
    fn test_spond_source_requires_section() {
        let config = AppConfig::default();
        assert!(matches!(
            build_source(&config),
            Err(GroupsError::MissingConfigError { .. })
        ));
    }
}
