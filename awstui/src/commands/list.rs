use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{load_sdk_config, OutputFormat};
use crate::{
  cli::GlobalArgs,
  resource::{self, ResourceKind},
};

/// Input arguments for `list` command
#[derive(Args, Debug)]
pub struct ListResources {
  /// Kind of resource to list
  #[arg(value_enum, ignore_case = true)]
  pub kind: ResourceKind,

  /// Profile used to call AWS
  #[arg(long, env = "AWS_PROFILE")]
  pub profile: String,

  /// Format of the printed resources
  #[arg(long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

impl ListResources {
  pub async fn print(&self, global: &GlobalArgs) -> Result<()> {
    let config = load_sdk_config(global, &self.profile).await?;
    let resources = resource::list_resources(self.kind, &config).await?;
    info!("Listed {} for profile {}", self.kind.title(), self.profile);

    match self.output {
      OutputFormat::Table => println!("{}", resources.table().render()),
      OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resources)?),
    }

    Ok(())
  }
}
