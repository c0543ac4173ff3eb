//! In-memory stand-in for the cloudscale.ch API

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

use cloudscale_common::{Error, Record, Result};
use cloudscale_provider::Transport;

pub const BASE: &str = "https://api.fake.test/v1/";

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Status values a freshly created record walks through, one per item GET
struct Progression {
    field: &'static str,
    values: Vec<&'static str>,
}

#[derive(Default)]
struct State {
    collections: BTreeMap<String, Vec<Record>>,
    progressions: BTreeMap<String, Progression>,
    pending: BTreeMap<String, (&'static str, VecDeque<&'static str>)>,
    calls: Vec<Call>,
    next_ip: u8,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<State>,
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

pub fn href(path: &str) -> String {
    format!("{}{}", BASE, path)
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record; `href` is derived from the id when missing
    pub fn insert(&self, collection: &str, value: Value) {
        let mut rec = record(value);
        if !rec.contains_key("href") {
            if let Some(id) = rec.get("uuid").and_then(Value::as_str) {
                let link = href(&format!("{}/{}", collection, id));
                rec.insert("href".to_string(), Value::String(link));
            }
        }
        self.state
            .lock()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(rec);
    }

    /// Records created in `collection` report `field` as each of `values` in
    /// turn, advancing on every item GET.
    pub fn progress(&self, collection: &str, field: &'static str, values: &[&'static str]) {
        self.state.lock().progressions.insert(
            collection.to_string(),
            Progression {
                field,
                values: values.to_vec(),
            },
        );
    }

    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.state
            .lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Calls other than GET
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.method != "GET")
            .collect()
    }

    pub fn gets(&self) -> usize {
        self.calls().iter().filter(|call| call.method == "GET").count()
    }
}

fn relative(path: &str) -> &str {
    path.strip_prefix(BASE).unwrap_or(path).trim_start_matches('/')
}

fn matches_id(rec: &Record, id: &str) -> bool {
    rec.get("uuid").and_then(Value::as_str) == Some(id)
        || rec
            .get("network")
            .and_then(Value::as_str)
            .and_then(|n| n.split('/').next())
            == Some(id)
}

fn not_found(method: &str, path: &str) -> Error {
    Error::Api {
        method: method.to_string(),
        path: path.to_string(),
        status: 404,
        detail: "{\"detail\": \"Not found.\"}".to_string(),
    }
}

impl State {
    /// Split `collection/id`, preferring the longest known collection
    fn locate(&self, path: &str) -> Option<(String, String)> {
        let (collection, id) = path.rsplit_once('/')?;
        self.collections
            .contains_key(collection)
            .then(|| (collection.to_string(), id.to_string()))
    }

    fn item_mut(&mut self, path: &str) -> Option<&mut Record> {
        let (collection, id) = self.locate(path)?;
        self.collections
            .get_mut(&collection)?
            .iter_mut()
            .find(|rec| matches_id(rec, &id))
    }

    fn advance(&mut self, path: &str) {
        let Some(uuid) = self
            .item_mut(path)
            .and_then(|rec| rec.get("uuid").and_then(Value::as_str).map(str::to_string))
        else {
            return;
        };
        let Some((field, values)) = self.pending.get_mut(&uuid) else {
            return;
        };
        let field = *field;
        if let Some(next) = values.pop_front() {
            if let Some(rec) = self.item_mut(path) {
                rec.insert(field.to_string(), Value::String(next.to_string()));
            }
        }
    }

    fn list(&self, path: &str) -> Option<Value> {
        let (collection, query) = match path.split_once('?') {
            Some((collection, query)) => (collection, Some(query)),
            None => (path, None),
        };
        let records = self.collections.get(collection)?;
        let tag_filter: Vec<(String, String)> = query
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect::<Vec<(String, String)>>())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| Some((key.strip_prefix("tag:")?.to_string(), value)))
            .collect();
        let listed: Vec<Value> = records
            .iter()
            .filter(|rec| {
                tag_filter.iter().all(|(key, value)| {
                    rec.get("tags")
                        .and_then(|t| t.get(key))
                        .and_then(Value::as_str)
                        == Some(value.as_str())
                })
            })
            .map(|rec| Value::Object(rec.clone()))
            .collect();
        Some(Value::Array(listed))
    }

    fn create(&mut self, collection: &str, body: Record) -> Record {
        let uuid = Uuid::new_v4().to_string();
        let mut rec = body;
        rec.insert("uuid".to_string(), json!(uuid));
        rec.insert(
            "created_at".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );

        match collection {
            "floating-ips" => {
                self.next_ip += 1;
                let ip = format!("192.0.2.{}", self.next_ip);
                rec.remove("uuid");
                rec.insert("network".to_string(), json!(format!("{}/32", ip)));
                rec.insert("href".to_string(), json!(href(&format!("floating-ips/{}", ip))));
            }
            "custom-images/import" => {
                let name = rec.remove("name").unwrap_or(Value::Null);
                rec.insert(
                    "custom_image".to_string(),
                    json!({"href": href(&format!("custom-images/{}", uuid)), "uuid": uuid, "name": name}),
                );
                rec.insert("status".to_string(), json!("started"));
                rec.insert("href".to_string(), json!(href(&format!("{}/{}", collection, uuid))));
            }
            "subnets" => {
                let network = rec
                    .get("network")
                    .and_then(Value::as_str)
                    .and_then(|id| {
                        self.collections
                            .get("networks")?
                            .iter()
                            .find(|n| matches_id(n, id))
                            .cloned()
                    });
                if let Some(network) = network {
                    rec.insert("network".to_string(), Value::Object(network));
                }
                rec.insert("href".to_string(), json!(href(&format!("{}/{}", collection, uuid))));
            }
            _ => {
                rec.insert("href".to_string(), json!(href(&format!("{}/{}", collection, uuid))));
            }
        }

        if let Some(progression) = self.progressions.get(collection) {
            let mut values: VecDeque<&'static str> = progression.values.iter().copied().collect();
            if let Some(first) = values.pop_front() {
                rec.insert(progression.field.to_string(), json!(first));
            }
            self.pending.insert(uuid, (progression.field, values));
        }

        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(rec.clone());
        rec
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        let mut state = self.state.lock();
        state.calls.push(Call {
            method: "GET",
            path: path.to_string(),
            body: None,
        });
        let path = relative(path);
        if let Some(listing) = state.list(path) {
            return Ok(Some(listing));
        }
        state.advance(path);
        Ok(state.item_mut(path).map(|rec| Value::Object(rec.clone())))
    }

    async fn post(&self, path: &str, body: Option<Record>) -> Result<Option<Value>> {
        let body = cloudscale_provider::client::sanitize(body.unwrap_or_default());
        let mut state = self.state.lock();
        state.calls.push(Call {
            method: "POST",
            path: path.to_string(),
            body: Some(Value::Object(body.clone())),
        });
        let created = state.create(relative(path), body);
        Ok(Some(Value::Object(created)))
    }

    async fn patch(&self, path: &str, body: Option<Record>) -> Result<Option<Value>> {
        let body = cloudscale_provider::client::sanitize(body.unwrap_or_default());
        let mut state = self.state.lock();
        state.calls.push(Call {
            method: "PATCH",
            path: path.to_string(),
            body: Some(Value::Object(body.clone())),
        });
        let rec = state
            .item_mut(relative(path))
            .ok_or_else(|| not_found("PATCH", path))?;
        for (key, value) in body {
            // Nested settings merge, tags are replaced wholesale.
            if key != "tags" {
                if let (Some(Value::Object(existing)), Value::Object(update)) =
                    (rec.get_mut(&key), &value)
                {
                    existing.extend(update.clone());
                    continue;
                }
            }
            rec.insert(key, value);
        }
        Ok(None)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call {
            method: "DELETE",
            path: path.to_string(),
            body: None,
        });
        let (collection, id) = state
            .locate(relative(path))
            .ok_or_else(|| not_found("DELETE", path))?;
        let records = state
            .collections
            .get_mut(&collection)
            .ok_or_else(|| not_found("DELETE", path))?;
        let before = records.len();
        records.retain(|rec| !matches_id(rec, &id));
        if records.len() == before {
            return Err(not_found("DELETE", path));
        }
        Ok(())
    }
}
