pub mod describe;
pub mod list;
pub mod profiles;
pub mod ui;

use anyhow::Result;
use aws_config::SdkConfig;
use clap::ValueEnum;

use crate::{cli::GlobalArgs, profile};

/// Output format for non-interactive commands
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Table,
  Json,
}

/// Resolve the profiles and load the SDK configuration for `name`
async fn load_sdk_config(global: &GlobalArgs, name: &str) -> Result<SdkConfig> {
  let sources = global.sources()?;
  let profiles = global.profiles(&sources)?;

  Ok(profile::lookup_configuration(&profiles, name, &sources, global.region.clone()).await?)
}
