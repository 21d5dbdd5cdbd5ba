use crate::config::toml_config::SpondConfig;
use crate::domain::model::Attendee;
use crate::domain::ports::AttendeeSource;
use crate::utils::error::{GroupsError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    login_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpondEvent {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    heading: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    end_timestamp: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    responses: EventResponses,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponses {
    #[serde(default, deserialize_with = "string_ids")]
    accepted_ids: Vec<String>,
    #[serde(default, deserialize_with = "string_ids")]
    declined_ids: Vec<String>,
    #[serde(default, deserialize_with = "string_ids")]
    unanswered_ids: Vec<String>,
    #[serde(default, deserialize_with = "string_ids")]
    waitinglist_ids: Vec<String>,
    #[serde(default, deserialize_with = "string_ids")]
    unconfirmed_ids: Vec<String>,
}

// Spond 偶爾回傳 null 或型別不符的欄位，略過而不是整批失敗
fn lenient_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_opt_string(deserializer).map(Option::unwrap_or_default)
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn string_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(id),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

impl EventResponses {
    fn invited(&self) -> HashSet<&str> {
        self.accepted_ids
            .iter()
            .chain(&self.declined_ids)
            .chain(&self.unanswered_ids)
            .chain(&self.waitinglist_ids)
            .chain(&self.unconfirmed_ids)
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct SpondGroup {
    id: String,
    #[serde(default)]
    members: Vec<SpondMember>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpondMember {
    id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

impl SpondMember {
    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Reads the attendees of the next matching session from the Spond API.
pub struct SpondSource {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    group_id: String,
    heading_filter: String,
    lookahead: chrono::Duration,
    include_fixed_members: bool,
}

impl SpondSource {
    pub fn new(config: &SpondConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            username: config.username.clone().unwrap_or_default(),
            password: config.password.clone().unwrap_or_default(),
            group_id: config.group_id.clone().unwrap_or_default(),
            heading_filter: config.heading_filter().to_lowercase(),
            lookahead: chrono::Duration::days(i64::from(config.lookahead_days())),
            include_fixed_members: config.include_fixed_members.unwrap_or(false),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn login(&self) -> Result<String> {
        // 帳號含 @ 視為 email，否則當作手機號碼
        let account_field = if self.username.contains('@') {
            "email"
        } else {
            "phoneNumber"
        };
        let mut body = Map::new();
        body.insert(account_field.to_string(), Value::String(self.username.clone()));
        body.insert("password".to_string(), Value::String(self.password.clone()));

        tracing::debug!("Logging in to Spond at {}", self.base_url);
        let response = self.client.post(self.url("login")).json(&body).send().await?;
        let login: LoginResponse = ensure_success(response, "login").await?.json().await?;
        Ok(login.login_token)
    }

    async fn upcoming_events(&self, token: &str, now: DateTime<Utc>) -> Result<Vec<SpondEvent>> {
        let min_end = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let max_end = (now + self.lookahead).to_rfc3339_opts(SecondsFormat::Millis, true);
        let response = self
            .client
            .get(self.url("sponds"))
            .bearer_auth(token)
            .query(&[
                ("groupId", self.group_id.as_str()),
                ("minEndTimestamp", min_end.as_str()),
                ("maxEndTimestamp", max_end.as_str()),
                ("order", "asc"),
                ("max", "100"),
                ("scheduled", "true"),
                ("includeHidden", "false"),
            ])
            .send()
            .await?;

        let raw: Vec<Value> = ensure_success(response, "events").await?.json().await?;
        let total = raw.len();
        let events: Vec<SpondEvent> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping malformed Spond event: {}", e);
                    None
                }
            })
            .collect();
        tracing::debug!("Spond returned {} events ({} usable)", total, events.len());
        Ok(events)
    }

    async fn member_names(&self, token: &str) -> Result<Vec<SpondMember>> {
        let response = self
            .client
            .get(self.url("groups/"))
            .bearer_auth(token)
            .send()
            .await?;
        let groups: Vec<SpondGroup> = ensure_success(response, "groups").await?.json().await?;

        groups
            .into_iter()
            .find(|group| group.id == self.group_id)
            .map(|group| group.members)
            .ok_or_else(|| {
                GroupsError::not_found(format!("Spond group {} is not visible", self.group_id))
            })
    }

    /// Earliest-ending event inside the window whose heading matches.
    fn next_session(&self, events: Vec<SpondEvent>, now: DateTime<Utc>) -> Option<SpondEvent> {
        let until = now + self.lookahead;
        events
            .into_iter()
            .filter(|event| event.heading.to_lowercase().contains(&self.heading_filter))
            .filter_map(|event| {
                let end = event
                    .end_timestamp
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())?
                    .with_timezone(&Utc);
                (now <= end && end <= until).then_some((end, event))
            })
            .min_by_key(|(end, _)| *end)
            .map(|(_, event)| event)
    }

    fn attendees_for(&self, event: &SpondEvent, members: &[SpondMember]) -> Vec<Attendee> {
        let names: HashMap<&str, String> = members
            .iter()
            .map(|member| (member.id.as_str(), member.full_name()))
            .collect();

        let mut attendees = Vec::new();
        if self.include_fixed_members {
            // 固定成員不會收到邀請，因此不在任何回覆清單中
            let invited = event.responses.invited();
            attendees.extend(
                members
                    .iter()
                    .filter(|member| !invited.contains(member.id.as_str()))
                    .map(|member| Attendee::Name(member.full_name())),
            );
        }

        attendees.extend(event.responses.accepted_ids.iter().map(|id| {
            Attendee::Name(names.get(id.as_str()).cloned().unwrap_or_else(|| id.clone()))
        }));
        attendees
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!("Spond {} request failed with {}: {}", what, status, body);
    Err(GroupsError::source_unavailable(format!(
        "Spond {} request failed with status {}",
        what, status
    )))
}

#[async_trait]
impl AttendeeSource for SpondSource {
    async fn fetch_next_session_attendees(&self) -> Result<Vec<Attendee>> {
        let token = self.login().await?;
        let now = Utc::now();

        let events = self.upcoming_events(&token, now).await?;
        let event = self.next_session(events, now).ok_or_else(|| {
            GroupsError::not_found(format!(
                "no upcoming '{}' session in the next {} days",
                self.heading_filter,
                self.lookahead.num_days()
            ))
        })?;
        tracing::info!("📅 Next session: {} ({})", event.heading, event.id);

        let members = self.member_names(&token).await?;
        Ok(self.attendees_for(&event, &members))
    }

    fn name(&self) -> &'static str {
        "spond"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(base_url: String, include_fixed_members: bool) -> SpondConfig {
        SpondConfig {
            base_url: Some(base_url),
            username: Some("+4700000000".to_string()),
            password: Some("secret".to_string()),
            group_id: Some("GROUP1".to_string()),
            heading_filter: Some("Trening".to_string()),
            lookahead_days: Some(6),
            include_fixed_members: Some(include_fixed_members),
        }
    }

    fn ts(offset: chrono::Duration) -> String {
        (Utc::now() + offset).to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn mock_login(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST)
                .path("/login")
                .json_body(json!({"phoneNumber": "+4700000000", "password": "secret"}));
            then.status(200).json_body(json!({"loginToken": "tok"}));
        })
    }

    fn mock_groups(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(GET)
                .path("/groups/")
                .header("Authorization", "Bearer tok");
            then.status(200).json_body(json!([
                {"id": "OTHER", "members": []},
                {"id": "GROUP1", "members": [
                    {"id": "m1", "firstName": "Ola", "lastName": "Nordmann"},
                    {"id": "m2", "firstName": "Kari", "lastName": "Nordmann"},
                    {"id": "m3", "firstName": "Per", "lastName": "Hansen"},
                    {"id": "m4", "firstName": "Coach", "lastName": ""}
                ]}
            ]));
        })
    }

    fn events_body() -> Value {
        json!([
            {
                "id": "late",
                "heading": "Trening torsdag",
                "endTimestamp": ts(chrono::Duration::days(3)),
                "responses": {"acceptedIds": ["m3"]}
            },
            {
                "id": "match",
                "heading": "Kamp",
                "endTimestamp": ts(chrono::Duration::hours(2)),
                "responses": {"acceptedIds": ["m1", "m2", "m3"]}
            },
            {
                "id": "broken",
                "heading": "Trening uten tid",
                "endTimestamp": "not a timestamp"
            },
            {
                "id": "next",
                "heading": "trening tirsdag",
                "endTimestamp": ts(chrono::Duration::days(1)),
                "responses": {
                    "acceptedIds": ["m1", "ghost"],
                    "declinedIds": ["m2"]
                }
            }
        ])
    }

    #[tokio::test]
    async fn test_fetches_accepted_attendees_of_next_training() {
        let server = MockServer::start();
        let login = mock_login(&server);
        let events = server.mock(|when, then| {
            when.method(GET)
                .path("/sponds")
                .query_param("groupId", "GROUP1")
                .header("Authorization", "Bearer tok");
            then.status(200).json_body(events_body());
        });
        let groups = mock_groups(&server);

        let source = SpondSource::new(&config(server.base_url(), false), Duration::from_secs(5)).unwrap();
        let attendees = source.fetch_next_session_attendees().await.unwrap();

        login.assert();
        events.assert();
        groups.assert();
        assert_eq!(
            attendees,
            vec![Attendee::from("Ola Nordmann"), Attendee::from("ghost")]
        );
    }

    #[tokio::test]
    async fn test_includes_fixed_members_first() {
        let server = MockServer::start();
        mock_login(&server);
        server.mock(|when, then| {
            when.method(GET).path("/sponds");
            then.status(200).json_body(events_body());
        });
        mock_groups(&server);

        let source = SpondSource::new(&config(server.base_url(), true), Duration::from_secs(5)).unwrap();
        let attendees = source.fetch_next_session_attendees().await.unwrap();

        assert_eq!(
            attendees,
            vec![
                Attendee::from("Per Hansen"),
                Attendee::from("Coach"),
                Attendee::from("Ola Nordmann"),
                Attendee::from("ghost"),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_matching_session_is_not_found() {
        let server = MockServer::start();
        mock_login(&server);
        server.mock(|when, then| {
            when.method(GET).path("/sponds");
            then.status(200).json_body(json!([
                {"id": "past", "heading": "Trening", "endTimestamp": ts(-chrono::Duration::days(1))},
                {"id": "far", "heading": "Trening", "endTimestamp": ts(chrono::Duration::days(30))}
            ]));
        });

        let source = SpondSource::new(&config(server.base_url(), false), Duration::from_secs(5)).unwrap();
        let err = source.fetch_next_session_attendees().await.unwrap_err();

        assert!(matches!(err, GroupsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_irregular_events_do_not_block_next_session() {
        let server = MockServer::start();
        mock_login(&server);
        server.mock(|when, then| {
            when.method(GET).path("/sponds");
            then.status(200).json_body(json!([
                "not an event",
                {"id": 42, "heading": null, "endTimestamp": ts(chrono::Duration::hours(1))},
                {"id": "empty", "heading": "Trening", "endTimestamp": null, "responses": null},
                {
                    "id": "next",
                    "heading": "Trening",
                    "endTimestamp": ts(chrono::Duration::days(1)),
                    "responses": {"acceptedIds": ["m1", 7, null, "m3"], "declinedIds": null}
                }
            ]));
        });
        mock_groups(&server);

        let source = SpondSource::new(&config(server.base_url(), false), Duration::from_secs(5)).unwrap();
        let attendees = source.fetch_next_session_attendees().await.unwrap();

        assert_eq!(
            attendees,
            vec![Attendee::from("Ola Nordmann"), Attendee::from("Per Hansen")]
        );
    }

    #[tokio::test]
    async fn test_login_failure_is_source_unavailable() {
        let server = MockServer::start();
        let login = server.mock(|when, then| {
            when.method(POST).path("/login");
            then.status(401).body("bad credentials");
        });

        let source = SpondSource::new(&config(server.base_url(), false), Duration::from_secs(5)).unwrap();
        let err = source.fetch_next_session_attendees().await.unwrap_err();

        login.assert();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_email_login_field() {
        let server = MockServer::start();
        let login = server.mock(|when, then| {
            when.method(POST)
                .path("/login")
                .json_body(json!({"email": "coach@club.no", "password": "secret"}));
            then.status(200).json_body(json!({"loginToken": "tok"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/sponds");
            then.status(200).json_body(json!([]));
        });

        let mut cfg = config(server.base_url(), false);
        cfg.username = Some("coach@club.no".to_string());
        let source = SpondSource::new(&cfg, Duration::from_secs(5)).unwrap();
        let err = source.fetch_next_session_attendees().await.unwrap_err();

        login.assert();
        assert!(matches!(err, GroupsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_retryable() {
        // 沒有服務監聽的埠
        let source = SpondSource::new(
            &config("http://127.0.0.1:9".to_string(), false),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = source.fetch_next_session_attendees().await.unwrap_err();

        assert!(matches!(err, GroupsError::ApiError(_)));
        assert!(err.is_retryable());
    }
}
