use serde::{Deserialize, Serialize};

/// Id of the synthetic root the hierarchy endpoint wraps every user's tags in.
/// Never sent to the backend for creation and never deletable.
pub const ROOT_TAG_ID: i64 = 0;

/// Typed-value kind carried by a tag. Only `String` is exercised today; the
/// enum exists so richer kinds (numeric ranges, dates) slot in later.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TagValueType {
    #[default]
    String,
    Group,
}

impl std::fmt::Display for TagValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValueType::String => write!(f, "string"),
            TagValueType::Group => write!(f, "group"),
        }
    }
}

impl From<&str> for TagValueType {
    fn from(s: &str) -> Self {
        match s {
            "group" => TagValueType::Group,
            _ => TagValueType::String,
        }
    }
}

/// One node of the user's tag taxonomy.
///
/// The hierarchy endpoint returns the whole tree in one snapshot; `children`
/// is only populated there and is empty on leaf nodes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: TagValueType,
    /// None only for the synthetic root
    #[serde(rename = "parent")]
    pub parent_id: Option<i64>,
    /// Locked tags reject deletion and rename; true for the synthetic root
    pub locked: bool,
    #[serde(rename = "user_id")]
    pub owner_id: i64,
    #[serde(default)]
    pub children: Vec<Tag>,
}

impl Tag {
    /// The synthetic root sentinel, as the hierarchy endpoint emits it.
    /// Used as the fallback parent selection when a referenced tag is deleted.
    pub fn root_sentinel(owner_id: i64) -> Self {
        Tag {
            id: ROOT_TAG_ID,
            name: "Root".to_string(),
            value_type: TagValueType::Group,
            parent_id: None,
            locked: true,
            owner_id,
            children: Vec::new(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Look up a node anywhere in this subtree by id
    pub fn find(&self, id: i64) -> Option<&Tag> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Creation payload for `POST /tag/tags`
#[derive(Debug, Serialize, Clone)]
pub struct TagIn {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: TagValueType,
    #[serde(rename = "parent")]
    pub parent_id: i64,
    pub locked: bool,
    #[serde(rename = "user_id")]
    pub owner_id: i64,
}

/// Response from the tag delete endpoint. The backend cascades deletion to
/// descendants and reports every id it removed.
#[derive(Debug, Deserialize, Clone)]
pub struct TagDeleteReport {
    #[serde(default)]
    pub message: String,
    pub deleted_count: usize,
    pub deleted_ids: Vec<i64>,
}
