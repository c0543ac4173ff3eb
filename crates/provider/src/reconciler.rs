//! Present/absent reconciliation
//!
//! Drives one resource towards the desired presence: query, then create,
//! update field by field, or delete. Every pass records a diff and whether
//! anything changed. In check mode nothing is mutated server-side but the
//! diff is still computed.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use cloudscale_common::{ChangeSet, Error, Identity, Outcome, Presence, Record, ResourceState, Result};

use crate::client::Transport;
use crate::resources::Adapter;
use crate::state::{differs, into_record, lookup, stub_id};
use crate::waiter::{Refresh, Waiter};

pub struct Reconciler<A> {
    api: Arc<dyn Transport>,
    adapter: A,
    check_mode: bool,
    waiter: Waiter,
    changes: ChangeSet,
    /// Identity learned from the server, used for refreshes
    known: Identity,
}

impl<A: Adapter> Reconciler<A> {
    pub fn new(api: Arc<dyn Transport>, adapter: A) -> Self {
        Self {
            api,
            adapter,
            check_mode: false,
            waiter: Waiter::default(),
            changes: ChangeSet::default(),
            known: Identity::default(),
        }
    }

    pub fn check_mode(mut self, enabled: bool) -> Self {
        self.check_mode = enabled;
        self
    }

    pub fn with_waiter(mut self, waiter: Waiter) -> Self {
        self.waiter = waiter;
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    fn kind(&self) -> &'static str {
        self.adapter.descriptor().kind
    }

    /// Caller identity completed with what the server told us
    fn identity(&self) -> Identity {
        let wanted = self.adapter.identity();
        Identity::new(
            wanted.id.or_else(|| self.known.id.clone()),
            wanted.name.or_else(|| self.known.name.clone()),
        )
    }

    fn stub(&self) -> ResourceState {
        let descriptor = self.adapter.descriptor();
        ResourceState::absent_stub(descriptor.id_key, descriptor.name_key, &self.identity())
    }

    fn remember(&mut self, record: &Record) {
        let descriptor = self.adapter.descriptor();
        let id = record.get(descriptor.id_key).and_then(stub_id).map(str::to_string);
        let name = record.get(descriptor.name_key).and_then(stub_id).map(str::to_string);
        if id.is_some() {
            self.known.id = id;
        }
        if name.is_some() {
            self.known.name = name;
        }
    }

    /// Look the resource up by identifying key, else by human key.
    pub async fn query(&mut self) -> Result<ResourceState> {
        let descriptor = self.adapter.descriptor();
        let (id_key, name_key) = (descriptor.id_key, descriptor.name_key);
        let collection = descriptor.collection.clone();
        let wanted = self.adapter.identity();

        let found = if let Some(id) = wanted.id.or_else(|| self.known.id.clone()) {
            debug!("Looking up {} by {} {}", self.kind(), id_key, id);
            self.adapter.query_by_id(&*self.api, &id).await?
        } else if let Some(name) = wanted.name {
            debug!("Looking up {} by {} {}", self.kind(), name_key, name);
            let mut matches = self.adapter.query_by_name(&*self.api, &name).await?;
            if matches.len() > 1 {
                return Err(Error::Ambiguous {
                    kind: collection,
                    key: name_key.to_string(),
                    value: name,
                    id_key: id_key.to_string(),
                });
            }
            matches.pop()
        } else {
            return Err(Error::MissingParameter(format!(
                "one of '{}' or '{}'",
                id_key, name_key
            )));
        };

        match found {
            Some(record) => {
                self.remember(&record);
                Ok(ResourceState::present(record))
            }
            None => Ok(self.stub()),
        }
    }

    /// Create the resource. Refused when the caller named an identifier
    /// that does not exist, since a new instance would get another one.
    pub async fn create(&mut self) -> Result<ResourceState> {
        let descriptor = self.adapter.descriptor();
        if let Some(id) = self.adapter.identity().id {
            return Err(Error::IdentityNotFound {
                kind: descriptor.collection.clone(),
                id_key: descriptor.id_key.to_string(),
                id,
            });
        }

        let payload = self.adapter.create_payload(&*self.api).await?.into_payload();
        let before = self.stub().to_record();
        self.changes.transition(before, payload.clone());

        let label = self.identity().label();
        if self.check_mode {
            info!("Would create {} {}", self.kind(), label);
            return Ok(ResourceState::present(payload));
        }

        info!("Creating {} {}", self.kind(), label);
        let created = self
            .api
            .post(&self.adapter.create_path(), Some(payload))
            .await?
            .and_then(into_record);
        if let Some(record) = &created {
            self.remember(record);
        }

        if let Some(targets) = self.adapter.waits().after_create {
            return self.wait_for(targets).await;
        }
        match created {
            Some(record) => Ok(self.adapter.created_state(record)),
            None => self.query().await,
        }
    }

    /// Bring each updatable field to its desired value with one PATCH per
    /// differing field.
    pub async fn update(&mut self, current: ResourceState) -> Result<ResourceState> {
        let kind = self.kind();
        let mut patched = false;

        for field in self.adapter.update_fields(&current) {
            let Some(desired) = field.value.clone() else {
                continue;
            };
            // Fields the server does not report cannot be compared.
            let Some(existing) = lookup(current.record(), field.parent, field.key) else {
                continue;
            };
            if !differs(existing, &desired) {
                continue;
            }

            self.changes
                .field(field.parent, field.key, existing.clone(), desired.clone());
            if self.check_mode {
                info!("Would update {} of {}", field.path(), kind);
                continue;
            }

            let href = current.href().ok_or_else(|| Error::Unaddressable {
                kind: kind.to_string(),
                field: field.path(),
            })?;
            info!("Updating {} of {} {}", field.path(), kind, href);
            self.api.patch(href, Some(field.patch_body(desired))).await?;
            patched = true;
        }

        if !patched {
            return Ok(current);
        }
        match self.adapter.waits().after_update {
            Some(targets) => self.wait_for(targets).await,
            None => self.query().await,
        }
    }

    /// Ensure the resource exists and matches the desired fields
    pub async fn present(&mut self) -> Result<Outcome> {
        self.changes = ChangeSet::default();

        let state = if self.adapter.force_create() {
            self.create().await?
        } else {
            let current = self.query().await?;
            if current.is_present() {
                self.update(current).await?
            } else {
                self.create().await?
            }
        };

        Ok(self.outcome(state.with_presence(Presence::Present)))
    }

    /// Ensure the resource does not exist
    pub async fn absent(&mut self) -> Result<Outcome> {
        self.changes = ChangeSet::default();

        let current = self.query().await?;
        if !current.is_present() {
            return Ok(self.outcome(current));
        }

        let after = self.stub().to_record();
        self.changes.transition(current.to_record(), after);

        if self.check_mode {
            info!("Would delete {} {}", self.kind(), self.identity().label());
        } else {
            let path = self
                .adapter
                .item_path(&current)
                .or_else(|| current.href().map(str::to_string))
                .ok_or_else(|| Error::Unaddressable {
                    kind: self.kind().to_string(),
                    field: "state".to_string(),
                })?;
            info!("Deleting {} {}", self.kind(), self.identity().label());
            self.api.delete(&path).await?;

            if let Some(targets) = self.adapter.waits().after_delete {
                self.wait_for(targets).await?;
            }
        }

        Ok(self.outcome(current.with_presence(Presence::Absent)))
    }

    /// Poll until the adapter's status label is one of `targets`
    pub async fn wait_for(&mut self, targets: &[&str]) -> Result<ResourceState> {
        let waiter = self.waiter;
        waiter.wait_for(self, targets).await
    }

    fn outcome(&self, state: ResourceState) -> Outcome {
        let mut record = state.to_record();
        self.adapter.finalize(&mut record);
        self.changes.clone().into_outcome(record)
    }
}

#[async_trait]
impl<A: Adapter> Refresh for Reconciler<A> {
    async fn refresh(&mut self) -> Result<ResourceState> {
        self.query().await
    }

    fn status_label(&self, state: &ResourceState) -> String {
        self.adapter.status_label(state)
    }

    fn kind(&self) -> String {
        self.adapter.descriptor().kind.to_string()
    }

    fn name(&self) -> String {
        self.identity().label()
    }
}
