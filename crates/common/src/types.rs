//! Core types shared by the reconciler, the adapters and the CLI

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A JSON object as returned by the API.
pub type Record = serde_json::Map<String, Value>;

/// Key under which the synthetic presence marker is reported.
pub const STATE_KEY: &str = "state";

// ============================================================================
// Presence
// ============================================================================

/// Whether a resource was found server-side at the last query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Present => "present",
            Presence::Absent => "absent",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Caller-supplied identity of a resource.
///
/// `id` is the identifying key (usually the UUID), `name` the human key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Identity {
    pub fn new(id: Option<String>, name: Option<String>) -> Self {
        Self { id, name }
    }

    /// Identifier used in diagnostics: the name if known, else the id.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

// ============================================================================
// Resource State
// ============================================================================

/// Runtime representation of one resource instance.
///
/// Replaced, never mutated in place, on every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState {
    presence: Presence,
    record: Record,
}

impl ResourceState {
    /// A resource found server-side.
    pub fn present(mut record: Record) -> Self {
        record.remove(STATE_KEY);
        Self {
            presence: Presence::Present,
            record,
        }
    }

    /// Stub for a resource that does not exist: only the identifying and
    /// human keys are carried.
    pub fn absent_stub(id_key: &str, name_key: &str, identity: &Identity) -> Self {
        let mut record = Record::new();
        record.insert(id_key.to_string(), opt_string(&identity.id));
        record.insert(name_key.to_string(), opt_string(&identity.name));
        Self {
            presence: Presence::Absent,
            record,
        }
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    pub fn is_present(&self) -> bool {
        self.presence == Presence::Present
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.record.get(key).and_then(Value::as_str)
    }

    /// Self-link of the resource, used for PATCH.
    pub fn href(&self) -> Option<&str> {
        self.str_field("href").filter(|h| !h.is_empty())
    }

    /// Same fields with a different presence marker.
    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Flat output record including the synthetic `state` field.
    pub fn to_record(&self) -> Record {
        let mut record = self.record.clone();
        record.insert(
            STATE_KEY.to_string(),
            Value::String(self.presence.as_str().to_string()),
        );
        record
    }
}

impl Serialize for ResourceState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

// ============================================================================
// Change Set
// ============================================================================

/// Accumulated diff of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub changed: bool,
    pub before: Record,
    pub after: Record,
}

impl ChangeSet {
    /// Monotonic: there is no way to reset `changed` within a pass.
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Whole-resource transition (create or delete).
    pub fn transition(&mut self, before: Record, after: Record) {
        self.mark_changed();
        self.before = before;
        self.after = after;
    }

    /// Single-field change, optionally nested one level below `parent`.
    pub fn field(&mut self, parent: Option<&str>, key: &str, before: Value, after: Value) {
        self.mark_changed();
        match parent {
            Some(parent) => {
                insert_nested(&mut self.before, parent, key, before);
                insert_nested(&mut self.after, parent, key, after);
            }
            None => {
                self.before.insert(key.to_string(), before);
                self.after.insert(key.to_string(), after);
            }
        }
    }

    /// Final result payload: the resource fields merged with the change set.
    pub fn into_outcome(self, resource: Record) -> Outcome {
        Outcome {
            changed: self.changed,
            diff: Diff {
                before: self.before,
                after: self.after,
            },
            resource,
        }
    }
}

fn insert_nested(record: &mut Record, parent: &str, key: &str, value: Value) {
    match record.get_mut(parent) {
        Some(Value::Object(map)) => {
            map.insert(key.to_string(), value);
        }
        _ => {
            let mut map = Record::new();
            map.insert(key.to_string(), value);
            record.insert(parent.to_string(), Value::Object(map));
        }
    }
}

/// Before/after pair reported to the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diff {
    pub before: Record,
    pub after: Record,
}

/// Result of a `present`/`absent` invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub diff: Diff,
    #[serde(flatten)]
    pub resource: Record,
}

impl Outcome {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.resource.get(key)
    }

    pub fn state(&self) -> Option<&str> {
        self.resource.get(STATE_KEY).and_then(Value::as_str)
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Resource tags. `Some(Tags::default())` clears all tags server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read tags from a server value; non-string tag values are skipped.
    pub fn from_value(value: &Value) -> Self {
        let map = value
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        Self(map)
    }
}

impl From<Tags> for Value {
    fn from(tags: Tags) -> Self {
        Value::Object(
            tags.0
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_stub_carries_only_identity() {
        let identity = Identity::new(None, Some("web".to_string()));
        let state = ResourceState::absent_stub("uuid", "name", &identity);

        assert!(!state.is_present());
        assert_eq!(
            Value::Object(state.to_record()),
            json!({"uuid": null, "name": "web", "state": "absent"})
        );
    }

    #[test]
    fn test_present_drops_stale_state_marker() {
        let record = json!({"uuid": "u1", "state": "absent"});
        let state = ResourceState::present(record.as_object().cloned().unwrap_or_default());
        assert_eq!(state.to_record()["state"], json!("present"));
    }

    #[test]
    fn test_change_set_is_monotonic() {
        let mut changes = ChangeSet::default();
        changes.field(None, "name", json!("a"), json!("b"));
        changes.field(Some("http"), "method", json!("GET"), json!("HEAD"));

        assert!(changes.changed);
        assert_eq!(Value::Object(changes.before.clone()), json!({"name": "a", "http": {"method": "GET"}}));
        assert_eq!(Value::Object(changes.after.clone()), json!({"name": "b", "http": {"method": "HEAD"}}));
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let mut changes = ChangeSet::default();
        changes.mark_changed();
        let state = ResourceState::present(json!({"uuid": "u1"}).as_object().cloned().unwrap_or_default());
        let outcome = changes.into_outcome(state.to_record());

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["changed"], json!(true));
        assert_eq!(value["uuid"], json!("u1"));
        assert_eq!(value["state"], json!("present"));
        assert_eq!(value["diff"], json!({"before": {}, "after": {}}));
    }

    #[test]
    fn test_tags_round_trip_through_value() {
        let tags: Tags = [("project", "demo")].into_iter().collect();
        let value: Value = tags.clone().into();
        assert_eq!(value, json!({"project": "demo"}));
        assert_eq!(Tags::from_value(&value), tags);
    }
}
