//! Custom Image Command

use anyhow::Result;
use clap::Args;

use cloudscale_common::{ApiConfig, Outcome};
use cloudscale_provider::resources::{CustomImage, CustomImageParams};

use super::{converge, DesiredState, TagArgs};

#[derive(Debug, Args)]
pub struct CustomImageArgs {
    /// Desired state
    #[arg(long, value_enum, default_value = "present")]
    pub state: DesiredState,

    /// Image UUID
    #[arg(long)]
    pub uuid: Option<String>,

    /// Image name
    #[arg(long)]
    pub name: Option<String>,

    /// Slug for referencing the image
    #[arg(long)]
    pub slug: Option<String>,

    /// URL to import the image from
    #[arg(long)]
    pub url: Option<String>,

    /// pass-through or extend-cloud-config
    #[arg(long)]
    pub user_data_handling: Option<String>,

    /// Zones to make the image available in, comma separated
    #[arg(long, value_delimiter = ',')]
    pub zones: Option<Vec<String>>,

    /// Source format (e.g., raw, qcow2)
    #[arg(long)]
    pub source_format: Option<String>,

    /// Import even if an image with this name exists
    #[arg(long)]
    pub force: bool,

    /// Wait until the import succeeded or failed
    #[arg(long)]
    pub wait: bool,

    #[command(flatten)]
    pub tags: TagArgs,
}

impl CustomImageArgs {
    fn params(&self) -> CustomImageParams {
        CustomImageParams {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            url: self.url.clone(),
            user_data_handling: self.user_data_handling.clone(),
            zones: self.zones.clone(),
            source_format: self.source_format.clone(),
            tags: self.tags.desired(),
            force: self.force,
            wait: self.wait,
        }
    }
}

pub async fn execute(args: CustomImageArgs, config: &ApiConfig) -> Result<Outcome> {
    converge(config, CustomImage::new(args.params()), args.state).await
}
