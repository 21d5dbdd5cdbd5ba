use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names consulted, in order, for a structured member's display name.
pub const NAME_FIELDS: [&str; 4] = ["name", "full_name", "fullName", "displayName"];

pub const ATTENDEES_KEY: &str = "attendees";
pub const GROUPS_KEY: &str = "groups";

/// A person eligible for group assignment.
///
/// Upstream sources hand back either a bare display name or a member object,
/// so both shapes are accepted and serialized back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attendee {
    Name(String),
    Member(Map<String, Value>),
}

impl Attendee {
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Attendee::Name(name) => Some(name.as_str()),
            Attendee::Member(fields) => NAME_FIELDS
                .iter()
                .find_map(|field| fields.get(*field).and_then(Value::as_str)),
        }
    }

    /// Trimmed, case-insensitive identity used for lookups.
    pub fn lookup_key(&self) -> Option<String> {
        self.display_name().map(normalize_name)
    }
}

impl From<&str> for Attendee {
    fn from(name: &str) -> Self {
        Attendee::Name(name.to_string())
    }
}

impl From<String> for Attendee {
    fn from(name: String) -> Self {
        Attendee::Name(name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub group_id: u32,
    pub members: Vec<Attendee>,
}

impl Group {
    pub fn new(group_id: u32) -> Self {
        Self {
            group_id,
            members: Vec::new(),
        }
    }
}

/// All groups produced by a single shuffle, persisted as one unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupSet(pub Vec<Group>);

impl GroupSet {
    pub fn groups(&self) -> &[Group] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.0.iter().map(|group| group.members.len()).sum()
    }

    /// Iterates members in group order, then member order.
    pub fn members(&self) -> impl Iterator<Item = &Attendee> {
        self.0.iter().flat_map(|group| group.members.iter())
    }
}

impl From<Vec<Group>> for GroupSet {
    fn from(groups: Vec<Group>) -> Self {
        GroupSet(groups)
    }
}
