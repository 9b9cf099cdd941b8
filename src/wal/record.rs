//! WAL Record
//!
//! Decoded frame payloads and their translation into engine commands.
//! Records are looser than commands: field names vary between writers
//! (`userId`/`user_id`, `db`/`database`) and the delete key can live in
//! several places.

use serde_json::{json, Map, Value};

use crate::error::{Result, WireError};
use crate::protocol::{Action, Command};

/// A logical operation read from the log
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WalRecord {
    pub op: Option<String>,
    pub user_id: Option<String>,
    pub db: Option<String>,
    pub collection: Option<String>,
    pub data: Option<Value>,
    pub filter: Option<Value>,
    pub update: Option<Value>,
    pub id: Option<Value>,

    /// The payload as decoded, kept for diagnostics
    raw: Value,
}

impl WalRecord {
    /// Parse a frame payload
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| WireError::Serialization(format!("WAL payload: {}", e)))?;
        Ok(Self::from_value(value))
    }

    /// Build a record from any JSON value
    ///
    /// Non-object payloads produce a record with no fields, which maps to no
    /// command.
    pub fn from_value(value: Value) -> Self {
        let fields = match value.as_object() {
            Some(obj) => Self {
                op: text(obj, "op"),
                user_id: text(obj, "userId").or_else(|| text(obj, "user_id")),
                db: text(obj, "db").or_else(|| text(obj, "database")),
                collection: text(obj, "collection"),
                data: present(obj, "data"),
                filter: present(obj, "filter"),
                update: present(obj, "update"),
                id: present(obj, "id"),
                raw: Value::Null,
            },
            None => Self::default(),
        };

        Self { raw: value, ..fields }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Key of the document a delete targets
    ///
    /// First usable of: top-level `id`, `data.id`, `filter.id`. Blank ids
    /// (`""`, `0`, `false`) are not usable and fall through to the next
    /// candidate.
    pub fn target_id(&self) -> Option<String> {
        let nested = |field: &Option<Value>| {
            field
                .as_ref()
                .and_then(|v| v.get("id"))
                .filter(|v| usable_id(v))
                .cloned()
        };

        self.id
            .clone()
            .filter(usable_id)
            .or_else(|| nested(&self.data))
            .or_else(|| nested(&self.filter))
            .map(|id| stringify(&id))
    }

    /// Translate into an engine command
    ///
    /// `PUT`/`INSERT` become `insert`, `DELETE` becomes `deleteOne` keyed by
    /// id, `UPDATE` becomes `updateOne`. The op is matched case-insensitively.
    /// Anything else (including a delete with no id) yields `None`.
    pub fn to_command(&self) -> Option<Command> {
        let op = self.op.as_deref()?.to_ascii_uppercase();

        let command = match op.as_str() {
            "PUT" | "INSERT" => Command {
                data: self.data.clone(),
                ..self.scoped(Action::Insert)
            },
            "DELETE" => Command {
                filter: Some(json!({ "id": self.target_id()? })),
                ..self.scoped(Action::DeleteOne)
            },
            "UPDATE" => Command {
                filter: Some(self.filter.clone().unwrap_or_else(empty_object)),
                update: Some(
                    self.update
                        .clone()
                        .or_else(|| self.data.clone())
                        .unwrap_or_else(empty_object),
                ),
                ..self.scoped(Action::UpdateOne)
            },
            _ => return None,
        };

        Some(command)
    }

    /// Command carrying this record's user/database/collection scope
    fn scoped(&self, action: Action) -> Command {
        Command {
            user_id: self.user_id.clone(),
            db_name: self.db.clone(),
            collection: self.collection.clone(),
            ..Command::new(action)
        }
    }
}

fn present(obj: &Map<String, Value>, key: &str) -> Option<Value> {
    obj.get(key).filter(|v| !v.is_null()).cloned()
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn usable_id(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        _ => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
