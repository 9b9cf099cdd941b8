//! Command definitions
//!
//! Represents requests sent to the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Operations understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Ping,
    Find,
    Insert,
    UpdateOne,
    DeleteOne,
    CreateDatabase,
    CreateCollection,
    ListDatabases,
    InitUserSpace,
    Bulk,
    InsertVector,
    QueryVector,
}

impl Action {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Ping => "ping",
            Action::Find => "find",
            Action::Insert => "insert",
            Action::UpdateOne => "updateOne",
            Action::DeleteOne => "deleteOne",
            Action::CreateDatabase => "createDatabase",
            Action::CreateCollection => "createCollection",
            Action::ListDatabases => "listDatabases",
            Action::InitUserSpace => "initUserSpace",
            Action::Bulk => "bulk",
            Action::InsertVector => "insertVector",
            Action::QueryVector => "queryVector",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request for one engine operation
///
/// Commands are built by value and never modified after being handed to
/// the client. Fields that are `None` are omitted from the wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub action: Action,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Value>,

    /// Sub-commands of a `bulk` batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ops: Option<Vec<Command>>,

    /// Action-specific fields outside the common set (e.g. `vector`, `k`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Command {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            user_id: None,
            db_name: None,
            collection: None,
            filter: None,
            data: None,
            update: None,
            ops: None,
            extra: Map::new(),
        }
    }

    /// Health check
    pub fn ping() -> Self {
        Self::new(Action::Ping)
    }

    /// Batch several commands into one round trip
    pub fn bulk(ops: Vec<Command>) -> Self {
        Self {
            ops: Some(ops),
            ..Self::new(Action::Bulk)
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn database(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn update(mut self, update: Value) -> Self {
        self.update = Some(update);
        self
    }

    /// Attach an action-specific field
    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}
