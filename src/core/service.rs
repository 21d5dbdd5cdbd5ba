use crate::core::engine;
use crate::domain::model::{Attendee, GroupSet, ATTENDEES_KEY, GROUPS_KEY};
use crate::domain::ports::{AttendeeSource, Store};
use crate::utils::error::{GroupsError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Coordinates the attendee source, the store and the engine.
///
/// Every store access happens under one lock so that a load, compute and
/// store sequence is never interleaved with another request's.
pub struct GroupService {
    store: Arc<dyn Store>,
    source: Arc<dyn AttendeeSource>,
    fetch_timeout: Duration,
    lock: Mutex<()>,
}

impl GroupService {
    pub fn new(
        store: Arc<dyn Store>,
        source: Arc<dyn AttendeeSource>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            source,
            fetch_timeout,
            lock: Mutex::new(()),
        }
    }

    pub async fn attendees(&self) -> Result<Vec<Attendee>> {
        let _guard = self.lock.lock().await;
        self.load(ATTENDEES_KEY).await
    }

    pub async fn replace_attendees(&self, attendees: Vec<Attendee>) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.save(ATTENDEES_KEY, &attendees).await?;
        tracing::info!("📝 Replaced attendees ({} entries)", attendees.len());
        Ok(())
    }

    /// Fetches the next session's attendees upstream and stores them.
    pub async fn refresh_attendees(&self) -> Result<Vec<Attendee>> {
        let attendees = self.fetch().await?;
        let _guard = self.lock.lock().await;
        self.save(ATTENDEES_KEY, &attendees).await?;
        Ok(attendees)
    }

    pub async fn groups(&self) -> Result<GroupSet> {
        let _guard = self.lock.lock().await;
        self.load_groups().await
    }

    pub async fn replace_groups(&self, groups: GroupSet) -> Result<()> {
        if groups.groups().iter().any(|group| group.group_id == 0) {
            return Err(GroupsError::invalid_argument(
                "group_id must be a positive integer",
            ));
        }
        let _guard = self.lock.lock().await;
        self.save(GROUPS_KEY, groups.groups()).await?;
        tracing::info!("📝 Replaced groups ({} groups)", groups.len());
        Ok(())
    }

    /// Shuffles the stored attendees (or a fresh upstream list when
    /// `refresh` is set) into `group_count` groups and stores the result.
    pub async fn shuffle_groups(&self, group_count: usize, refresh: bool) -> Result<GroupSet> {
        let fetched = if refresh {
            Some(self.fetch().await?)
        } else {
            None
        };

        let _guard = self.lock.lock().await;
        let (attendees, fresh) = match fetched {
            Some(attendees) => (attendees, true),
            None => (self.load(ATTENDEES_KEY).await?, false),
        };

        // 先分組再寫入，參數錯誤時不動到任何已存資料
        let groups = engine::shuffle(&attendees, group_count)?;
        if fresh {
            self.save(ATTENDEES_KEY, &attendees).await?;
        }
        self.save(GROUPS_KEY, groups.groups()).await?;

        tracing::info!(
            "🎲 Shuffled {} attendees into {} groups",
            attendees.len(),
            groups.len()
        );
        Ok(groups)
    }

    pub async fn swap_members(&self, name_one: &str, name_two: &str) -> Result<GroupSet> {
        let _guard = self.lock.lock().await;
        let groups = self.load_groups().await?;
        let swapped = engine::swap(groups, name_one, name_two)?;
        self.save(GROUPS_KEY, swapped.groups()).await?;

        tracing::info!("🔁 Swapped '{}' and '{}'", name_one, name_two);
        Ok(swapped)
    }

    async fn fetch(&self) -> Result<Vec<Attendee>> {
        tracing::debug!("Fetching attendees from {} source", self.source.name());
        let attendees =
            tokio::time::timeout(self.fetch_timeout, self.source.fetch_next_session_attendees())
                .await
                .map_err(|_| {
                    GroupsError::source_unavailable(format!(
                        "{} source did not answer within {:?}",
                        self.source.name(),
                        self.fetch_timeout
                    ))
                })??;

        tracing::info!(
            "📥 Fetched {} attendees from {} source",
            attendees.len(),
            self.source.name()
        );
        Ok(attendees)
    }

    async fn load_groups(&self) -> Result<GroupSet> {
        self.load(GROUPS_KEY).await.map(GroupSet)
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let values = self.store.get(key).await?;
        values
            .into_iter()
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    GroupsError::storage(format!("stored '{}' entry is malformed: {}", key, e))
                })
            })
            .collect()
    }

    async fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let values = items
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.store.replace(key, values).await
    }
}
