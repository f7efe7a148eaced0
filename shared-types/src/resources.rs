use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Hint {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Learn {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Action {
    pub id: i64,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Terminate {
    pub id: i64,
    pub content: String,
    pub created_at: i64,
}

/// The four resource libraries, named as they appear in URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ResourceKind {
    #[serde(rename = "hints")]
    Hint,
    #[serde(rename = "learns")]
    Learn,
    #[serde(rename = "actions")]
    Action,
    #[serde(rename = "terminates")]
    Terminate,
}

impl ResourceKind {
    /// Table backing this kind.
    pub fn table(&self) -> &'static str {
        match self {
            ResourceKind::Hint => "hints",
            ResourceKind::Learn => "learns",
            ResourceKind::Action => "actions",
            ResourceKind::Terminate => "terminates",
        }
    }

    pub fn has_title(&self) -> bool {
        matches!(self, ResourceKind::Hint | ResourceKind::Learn)
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hints" => Ok(ResourceKind::Hint),
            "learns" => Ok(ResourceKind::Learn),
            "actions" => Ok(ResourceKind::Action),
            "terminates" => Ok(ResourceKind::Terminate),
            other => Err(format!("unknown resource kind '{}'", other)),
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Body for creating or updating any resource; `title` is only read for
/// hints and learns.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateResourceRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResourcesResponse {
    pub hints: Vec<Hint>,
    pub learns: Vec<Learn>,
    pub actions: Vec<Action>,
    pub terminates: Vec<Terminate>,
}
