use crate::domain::model::Attendee;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Key-addressed store of JSON arrays. Last write wins.
#[async_trait]
pub trait Store: Send + Sync {
    /// Unset keys yield the configured seed, or an empty vec.
    async fn get(&self, key: &str) -> Result<Vec<Value>>;
    async fn replace(&self, key: &str, values: Vec<Value>) -> Result<()>;
}

#[async_trait]
pub trait AttendeeSource: Send + Sync {
    async fn fetch_next_session_attendees(&self) -> Result<Vec<Attendee>>;

    fn name(&self) -> &'static str;
}
