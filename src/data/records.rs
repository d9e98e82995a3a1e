//! Typed input records
//!
//! Join keys: `Connection.source_id` / `target_id` and
//! `ActivityLink.profile_id` refer to `Profile.id`; `ActivityLink.activity_id`
//! refers to `ContentRecord.id`.

use crate::graph::EdgeLabel;
use serde::{Deserialize, Deserializer, Serialize};

/// Profile type that becomes a graph node
pub const PERSON_PROFILE_TYPE: &str = "person";

/// A social-network profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub profile_type: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl Profile {
    pub fn is_person(&self) -> bool {
        self.profile_type == PERSON_PROFILE_TYPE
    }
}

/// An observed relationship event between two profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: i64,
    pub source_id: i64,
    pub target_id: i64,
    pub connection_type: String,
}

impl Connection {
    pub fn kind(&self) -> Option<ConnectionKind> {
        ConnectionKind::from_connection_type(&self.connection_type)
    }
}

/// Maps an activity (post, comment) to the profile that owns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLink {
    #[serde(default, deserialize_with = "lenient_optional_id")]
    pub profile_id: Option<i64>,
    pub activity_id: i64,
}

/// One LLM-enriched post or comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Activity id this content belongs to
    pub id: i64,
    pub traffic_likelihood: i64,
    pub species_being_mentioned: Vec<String>,
    pub location: Vec<String>,
    pub pii: Vec<String>,
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Relationship family a connection kind belongs to; the unit of selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    Friends,
    Groups,
    Follows,
    Comments,
    Tags,
}

/// The fixed connection-type vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    FriendsListUpdate,
    FriendAdded,
    GroupMembership,
    Follow,
    Comment,
    Mention,
}

impl ConnectionKind {
    /// Staging order used when building the graph
    pub const ALL: [ConnectionKind; 6] = [
        ConnectionKind::FriendsListUpdate,
        ConnectionKind::FriendAdded,
        ConnectionKind::GroupMembership,
        ConnectionKind::Follow,
        ConnectionKind::Comment,
        ConnectionKind::Mention,
    ];

    /// Raw `connection_type` value as stored in the source tables
    pub fn connection_type(&self) -> &'static str {
        match self {
            ConnectionKind::FriendsListUpdate => "updated-friends-list-on-facebook",
            ConnectionKind::FriendAdded => "ADDED_THEM_AS_A_FRIEND_ON_FACEBOOK",
            ConnectionKind::GroupMembership => "BECAME_MEMBER_OF_GROUP_ON_FACEBOOK",
            ConnectionKind::Follow => "FOLLOWED_THEM_ON_FACEBOOK",
            ConnectionKind::Comment => "COMMENTED_ON_THEIR_POST_ON_FACEBOOK",
            ConnectionKind::Mention => "MENTIONED_THEM_ON_FACEBOOK",
        }
    }

    pub fn from_connection_type(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.connection_type() == raw)
    }

    pub fn edge_label(&self) -> EdgeLabel {
        match self {
            ConnectionKind::FriendsListUpdate | ConnectionKind::FriendAdded => EdgeLabel::FriendWith,
            ConnectionKind::GroupMembership => EdgeLabel::InSameGroup,
            ConnectionKind::Follow => EdgeLabel::Follower,
            ConnectionKind::Comment => EdgeLabel::CommentedOn,
            ConnectionKind::Mention => EdgeLabel::Tagged,
        }
    }

    pub fn relationship(&self) -> Relationship {
        match self {
            ConnectionKind::FriendsListUpdate | ConnectionKind::FriendAdded => Relationship::Friends,
            ConnectionKind::GroupMembership => Relationship::Groups,
            ConnectionKind::Follow => Relationship::Follows,
            ConnectionKind::Comment => Relationship::Comments,
            ConnectionKind::Mention => Relationship::Tags,
        }
    }
}

/// Accepts `12`, `12.0`, `"12"` or null for nullable id columns
fn lenient_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
                    _ => Err(D::Error::custom(format!("non-integral id: {}", n))),
                }
            }
        }
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid id: {:?}", s)))
        }
        Some(other) => Err(D::Error::custom(format!("invalid id: {}", other))),
    }
}
