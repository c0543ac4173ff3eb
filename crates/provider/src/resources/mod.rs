//! Resource Adapters
//!
//! Each adapter tells the reconciler how one cloudscale.ch resource kind is
//! addressed, looked up, created and updated.

pub mod custom_image;
pub mod floating_ip;
pub mod health_monitor;
pub mod load_balancer;
pub mod pool;
pub mod pool_member;
pub mod subnet;

pub use custom_image::{CustomImage, CustomImageParams};
pub use floating_ip::{FloatingIp, FloatingIpParams};
pub use health_monitor::{HealthMonitor, HealthMonitorParams, HttpCheck};
pub use load_balancer::{LoadBalancer, LoadBalancerParams, VipAddress};
pub use pool::{Pool, PoolParams};
pub use pool_member::{PoolMember, PoolMemberParams};
pub use subnet::{NetworkRef, Subnet, SubnetParams};

use async_trait::async_trait;
use serde_json::Value;

use cloudscale_common::{Identity, Presence, Record, ResourceState, Result};

use crate::client::Transport;
use crate::state::{into_record, into_records, str_attr};

/// Addressing of a resource kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Name used in log lines and diagnostics
    pub kind: &'static str,
    /// Collection path relative to the API base, without trailing slash
    pub collection: String,
    /// Field that uniquely identifies an instance
    pub id_key: &'static str,
    /// Human-meaningful field, not necessarily unique
    pub name_key: &'static str,
}

impl ResourceDescriptor {
    pub fn new(
        kind: &'static str,
        collection: impl Into<String>,
        id_key: &'static str,
        name_key: &'static str,
    ) -> Self {
        Self {
            kind,
            collection: collection.into(),
            id_key,
            name_key,
        }
    }

    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.collection, id)
    }
}

/// One desired field. `value == None` means "no opinion".
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub parent: Option<&'static str>,
    pub key: &'static str,
    pub value: Option<Value>,
}

impl Field {
    /// Dotted path for diagnostics, e.g. `http.method`
    pub fn path(&self) -> String {
        match self.parent {
            Some(parent) => format!("{}.{}", parent, self.key),
            None => self.key.to_string(),
        }
    }

    /// Minimal PATCH body carrying only this field
    pub fn patch_body(&self, value: Value) -> Record {
        let mut body = Record::new();
        match self.parent {
            Some(parent) => {
                let mut nested = Record::new();
                nested.insert(self.key.to_string(), value);
                body.insert(parent.to_string(), Value::Object(nested));
            }
            None => {
                body.insert(self.key.to_string(), value);
            }
        }
        body
    }
}

/// Ordered list of desired fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<Field>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an optional top-level field
    pub fn opt<T: Clone + Into<Value>>(mut self, key: &'static str, value: &Option<T>) -> Self {
        self.0.push(Field {
            parent: None,
            key,
            value: value.clone().map(Into::into),
        });
        self
    }

    /// Add a top-level field that always has a value
    pub fn set(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.0.push(Field {
            parent: None,
            key,
            value: Some(value.into()),
        });
        self
    }

    /// Add an optional field one level below `parent`
    pub fn nested<T: Clone + Into<Value>>(
        mut self,
        parent: &'static str,
        key: &'static str,
        value: &Option<T>,
    ) -> Self {
        self.0.push(Field {
            parent: Some(parent),
            key,
            value: value.clone().map(Into::into),
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.0.iter()
    }

    /// Creation payload. Unset fields are sent as null and dropped by the
    /// transport.
    pub fn into_payload(self) -> Record {
        let mut payload = Record::new();
        for field in self.0 {
            let value = field.value.unwrap_or(Value::Null);
            match field.parent {
                Some(parent) => {
                    let entry = payload
                        .entry(parent.to_string())
                        .or_insert_with(|| Value::Object(Record::new()));
                    if let Value::Object(nested) = entry {
                        nested.insert(field.key.to_string(), value);
                    }
                }
                None => {
                    payload.insert(field.key.to_string(), value);
                }
            }
        }
        payload
    }
}

impl IntoIterator for Fields {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Status labels to poll for after each mutation, if any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Waits {
    pub after_create: Option<&'static [&'static str]>,
    pub after_update: Option<&'static [&'static str]>,
    pub after_delete: Option<&'static [&'static str]>,
}

/// Label of a resource that exists
pub const PRESENT: &str = "present";
/// Label of a resource that does not exist
pub const ABSENT: &str = "absent";

/// Per-kind behavior plugged into the generic reconciler
#[async_trait]
pub trait Adapter: Send + Sync {
    fn descriptor(&self) -> &ResourceDescriptor;

    /// Caller-supplied identity
    fn identity(&self) -> Identity;

    /// Fetch one instance by identifying key
    async fn query_by_id(&self, api: &dyn Transport, id: &str) -> Result<Option<Record>> {
        let path = self.descriptor().item_path(id);
        Ok(api.get(&path).await?.and_then(into_record))
    }

    /// All instances whose human key equals `name`
    async fn query_by_name(&self, api: &dyn Transport, name: &str) -> Result<Vec<Record>> {
        let descriptor = self.descriptor();
        let listing = api.get(&descriptor.collection).await?;
        Ok(into_records(listing)
            .into_iter()
            .filter(|record| str_attr(record, descriptor.name_key) == Some(name))
            .collect())
    }

    /// Where new instances are POSTed
    fn create_path(&self) -> String {
        self.descriptor().collection.clone()
    }

    /// Desired fields for creation, resolving references if needed
    async fn create_payload(&self, api: &dyn Transport) -> Result<Fields>;

    /// Representation of a freshly created instance
    fn created_state(&self, record: Record) -> ResourceState {
        ResourceState::present(record)
    }

    /// Desired values for the updatable fields
    fn update_fields(&self, current: &ResourceState) -> Fields;

    /// Path to DELETE an existing instance
    fn item_path(&self, current: &ResourceState) -> Option<String> {
        let descriptor = self.descriptor();
        current
            .str_field(descriptor.id_key)
            .map(|id| descriptor.item_path(id))
    }

    /// Label compared against wait targets
    fn status_label(&self, state: &ResourceState) -> String {
        state.presence().to_string()
    }

    fn waits(&self) -> Waits {
        Waits::default()
    }

    /// Create even when an instance with the same human key exists
    fn force_create(&self) -> bool {
        false
    }

    /// Last adjustment of the output record
    fn finalize(&self, _output: &mut Record) {}
}

/// Status field of a present record, else the presence label
pub(crate) fn status_or_presence(state: &ResourceState, key: &str) -> String {
    match state.presence() {
        Presence::Present => state
            .str_field(key)
            .map(str::to_string)
            .unwrap_or_else(|| PRESENT.to_string()),
        Presence::Absent => ABSENT.to_string(),
    }
}
