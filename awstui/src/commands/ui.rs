use anyhow::Result;
use clap::Args;

use crate::{cli::GlobalArgs, ui};

/// Input arguments for `ui` command
#[derive(Args, Debug, Default)]
pub struct Ui {}

impl Ui {
  /// Resolve profiles before taking over the terminal so source errors print normally
  pub async fn launch(&self, global: &GlobalArgs) -> Result<()> {
    let sources = global.sources()?;
    let profiles = global.profiles(&sources)?;

    ui::run(sources, profiles, global.region.clone()).await
  }
}
