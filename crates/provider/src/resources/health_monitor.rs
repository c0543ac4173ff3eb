//! Load balancer health monitors
//!
//! A monitor has no name. It is found through the pool it watches, and each
//! pool has at most one.

use async_trait::async_trait;
use serde_json::Value;

use cloudscale_common::{Error, Identity, Record, ResourceState, Result, Tags};

use super::{Adapter, Fields, ResourceDescriptor};
use crate::client::Transport;
use crate::state::{into_records, stub_id};

/// HTTP check settings, updated key by key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpCheck {
    pub expected_codes: Option<Vec<String>>,
    pub method: Option<String>,
    pub url_path: Option<String>,
    pub version: Option<String>,
    pub host: Option<String>,
}

impl HttpCheck {
    fn fields(&self, fields: Fields) -> Fields {
        fields
            .nested("http", "expected_codes", &self.expected_codes)
            .nested("http", "method", &self.method)
            .nested("http", "url_path", &self.url_path)
            .nested("http", "version", &self.version)
            .nested("http", "host", &self.host)
    }
}

impl From<HttpCheck> for Value {
    fn from(http: HttpCheck) -> Self {
        let set: Record = http
            .fields(Fields::new())
            .into_iter()
            .filter_map(|field| field.value.map(|value| (field.key.to_string(), value)))
            .collect();
        Value::Object(set)
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthMonitorParams {
    pub uuid: Option<String>,
    /// UUID of the watched pool
    pub pool: Option<String>,
    pub delay_s: Option<u32>,
    pub timeout_s: Option<u32>,
    pub up_threshold: Option<u32>,
    pub down_threshold: Option<u32>,
    /// `ping`, `tcp`, `http`, `https` or `tls-hello`
    pub monitor_type: Option<String>,
    pub http: Option<HttpCheck>,
    pub tags: Option<Tags>,
}

pub struct HealthMonitor {
    descriptor: ResourceDescriptor,
    params: HealthMonitorParams,
}

impl HealthMonitor {
    pub fn new(params: HealthMonitorParams) -> Self {
        Self {
            descriptor: ResourceDescriptor::new(
                "health monitor",
                "load-balancers/health-monitors",
                "uuid",
                "pool",
            ),
            params,
        }
    }
}

#[async_trait]
impl Adapter for HealthMonitor {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn identity(&self) -> Identity {
        Identity::new(self.params.uuid.clone(), self.params.pool.clone())
    }

    async fn query_by_name(&self, api: &dyn Transport, pool: &str) -> Result<Vec<Record>> {
        let listing = api.get(&self.descriptor.collection).await?;
        Ok(into_records(listing)
            .into_iter()
            .filter(|record| record.get("pool").and_then(stub_id) == Some(pool))
            .collect())
    }

    async fn create_payload(&self, _api: &dyn Transport) -> Result<Fields> {
        let p = &self.params;
        if p.pool.is_none() {
            return Err(Error::MissingParameter("pool".to_string()));
        }
        Ok(Fields::new()
            .opt("pool", &p.pool)
            .opt("delay_s", &p.delay_s)
            .opt("timeout_s", &p.timeout_s)
            .opt("up_threshold", &p.up_threshold)
            .opt("down_threshold", &p.down_threshold)
            .opt("type", &p.monitor_type)
            .opt("http", &p.http)
            .opt("tags", &p.tags))
    }

    fn update_fields(&self, _current: &ResourceState) -> Fields {
        let p = &self.params;
        let fields = Fields::new()
            .opt("delay_s", &p.delay_s)
            .opt("timeout_s", &p.timeout_s)
            .opt("up_threshold", &p.up_threshold)
            .opt("down_threshold", &p.down_threshold);
        let fields = match &p.http {
            Some(http) => http.fields(fields),
            None => fields,
        };
        fields.opt("tags", &p.tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn monitor(http: HttpCheck) -> HealthMonitor {
        HealthMonitor::new(HealthMonitorParams {
            pool: Some("p-1".to_string()),
            delay_s: Some(5),
            http: Some(http),
            ..Default::default()
        })
    }

    #[test]
    fn test_http_check_serializes_set_keys_only() {
        let http = HttpCheck {
            url_path: Some("/health".to_string()),
            expected_codes: Some(vec!["200".to_string()]),
            ..Default::default()
        };
        assert_eq!(
            Value::from(http),
            json!({"expected_codes": ["200"], "url_path": "/health"})
        );
    }

    #[test]
    fn test_update_fields_flatten_http_keys() {
        let m = monitor(HttpCheck {
            method: Some("HEAD".to_string()),
            ..Default::default()
        });
        let stub = ResourceState::absent_stub("uuid", "pool", &Identity::default());
        let paths: Vec<String> = m
            .update_fields(&stub)
            .iter()
            .map(|field| field.path())
            .collect();

        assert!(paths.contains(&"delay_s".to_string()));
        assert!(paths.contains(&"http.method".to_string()));
        assert!(paths.contains(&"http.host".to_string()));
        assert!(!paths.contains(&"pool".to_string()));
        assert!(!paths.contains(&"http".to_string()));
    }
}
