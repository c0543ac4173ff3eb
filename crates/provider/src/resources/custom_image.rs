//! Custom images
//!
//! Images are created by importing them from a URL. The import and the image
//! share a UUID, but the image record only appears once the import has made
//! progress, so lookups merge both collections.

use async_trait::async_trait;
use serde_json::Value;

use cloudscale_common::{Error, Identity, Record, ResourceState, Result, Tags};

use super::{status_or_presence, Adapter, Fields, ResourceDescriptor, Waits};
use crate::client::Transport;
use crate::state::{into_record, into_records, str_attr};

/// Where imports are POSTed and listed
pub const IMPORT_COLLECTION: &str = "custom-images/import";

/// Terminal import statuses
const IMPORT_DONE: &[&str] = &["success", "error", "failed"];

/// Import statuses that still stand for an image in the making
const IMPORT_PENDING: [&str; 2] = ["started", "in_progress"];

/// Import fields carried over when no image record exists yet
const IMPORT_CARRIED: [&str; 7] = [
    "url",
    "error_message",
    "slug",
    "user_data_handling",
    "zones",
    "source_format",
    "tags",
];

#[derive(Debug, Clone, Default)]
pub struct CustomImageParams {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    /// Source URL for the import
    pub url: Option<String>,
    /// `pass-through` or `extend-cloud-config`
    pub user_data_handling: Option<String>,
    pub zones: Option<Vec<String>>,
    /// e.g. `raw` or `qcow2`
    pub source_format: Option<String>,
    pub tags: Option<Tags>,
    /// Import even if an image with the same name exists
    pub force: bool,
    /// Block until the import succeeded or failed
    pub wait: bool,
}

pub struct CustomImage {
    descriptor: ResourceDescriptor,
    params: CustomImageParams,
}

impl CustomImage {
    pub fn new(params: CustomImageParams) -> Self {
        Self {
            descriptor: ResourceDescriptor::new("custom image", "custom-images", "uuid", "name"),
            params,
        }
    }
}

/// Combine an image record with its import record.
///
/// The image wins for overlapping fields. While no image record exists the
/// import stands in for it, without an `href` since it cannot be patched.
pub fn merge(image: Option<Record>, import: Option<Record>) -> Option<Record> {
    match (image, import) {
        (Some(mut image), import) => {
            if let Some(import) = import {
                for (src, dst) in [
                    ("status", "import_status"),
                    ("error_message", "error_message"),
                    ("url", "url"),
                ] {
                    if let Some(value) = import.get(src) {
                        image.entry(dst).or_insert_with(|| value.clone());
                    }
                }
            }
            Some(image)
        }
        (None, Some(import)) => Some(pending_image(&import)),
        (None, None) => None,
    }
}

fn pending_image(import: &Record) -> Record {
    let mut record = import
        .get("custom_image")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    record.remove("href");
    if !record.contains_key("uuid") {
        if let Some(uuid) = import.get("uuid") {
            record.insert("uuid".to_string(), uuid.clone());
        }
    }
    for key in IMPORT_CARRIED {
        if let Some(value) = import.get(key) {
            record.insert(key.to_string(), value.clone());
        }
    }
    if let Some(status) = import.get("status") {
        record.insert("import_status".to_string(), status.clone());
    }
    record
}

fn import_image_name(import: &Record) -> Option<&str> {
    import
        .get("custom_image")
        .and_then(|image| image.get("name"))
        .and_then(Value::as_str)
}

#[async_trait]
impl Adapter for CustomImage {
    fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    fn identity(&self) -> Identity {
        Identity::new(self.params.uuid.clone(), self.params.name.clone())
    }

    async fn query_by_id(&self, api: &dyn Transport, id: &str) -> Result<Option<Record>> {
        let image = api
            .get(&self.descriptor.item_path(id))
            .await?
            .and_then(into_record);
        let import = api
            .get(&format!("{}/{}", IMPORT_COLLECTION, id))
            .await?
            .and_then(into_record);
        Ok(merge(image, import))
    }

    async fn query_by_name(&self, api: &dyn Transport, name: &str) -> Result<Vec<Record>> {
        let images = into_records(api.get(&self.descriptor.collection).await?);
        let imports = into_records(api.get(IMPORT_COLLECTION).await?);

        let mut found: Vec<Record> = Vec::new();
        let mut image_ids: Vec<String> = Vec::new();
        for image in images.into_iter().filter(|i| str_attr(i, "name") == Some(name)) {
            let uuid = str_attr(&image, "uuid").map(str::to_string);
            let import = uuid.as_deref().and_then(|uuid| {
                imports
                    .iter()
                    .find(|import| str_attr(import, "uuid") == Some(uuid))
                    .cloned()
            });
            image_ids.extend(uuid);
            found.extend(merge(Some(image), import));
        }

        for import in imports.iter().filter(|import| {
            import_image_name(import) == Some(name)
                && str_attr(import, "status").map_or(false, |s| IMPORT_PENDING.contains(&s))
                && !str_attr(import, "uuid").map_or(false, |u| image_ids.iter().any(|id| id == u))
        }) {
            found.extend(merge(None, Some(import.clone())));
        }

        Ok(found)
    }

    fn create_path(&self) -> String {
        IMPORT_COLLECTION.to_string()
    }

    async fn create_payload(&self, _api: &dyn Transport) -> Result<Fields> {
        let p = &self.params;
        if p.url.is_none() {
            return Err(Error::MissingParameter("url".to_string()));
        }
        if p.name.is_none() {
            return Err(Error::MissingParameter("name".to_string()));
        }
        Ok(Fields::new()
            .opt("name", &p.name)
            .opt("slug", &p.slug)
            .opt("url", &p.url)
            .opt("user_data_handling", &p.user_data_handling)
            .opt("tags", &p.tags)
            .opt("zones", &p.zones)
            .opt("source_format", &p.source_format))
    }

    fn created_state(&self, import: Record) -> ResourceState {
        ResourceState::present(pending_image(&import))
    }

    fn update_fields(&self, _current: &ResourceState) -> Fields {
        let p = &self.params;
        Fields::new()
            .opt("name", &p.name)
            .opt("slug", &p.slug)
            .opt("user_data_handling", &p.user_data_handling)
            .opt("tags", &p.tags)
    }

    fn status_label(&self, state: &ResourceState) -> String {
        status_or_presence(state, "import_status")
    }

    fn waits(&self) -> Waits {
        Waits {
            after_create: self.params.wait.then_some(IMPORT_DONE),
            ..Waits::default()
        }
    }

    fn force_create(&self) -> bool {
        self.params.force
    }
}
