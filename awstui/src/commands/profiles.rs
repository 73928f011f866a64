use anyhow::Result;
use clap::Args;
use tabled::{builder::Builder, settings::Style};
use tracing::debug;

use super::OutputFormat;
use crate::{cli::GlobalArgs, profile::Profile, utils};

/// Input arguments for `profiles` command
#[derive(Args, Debug, Default)]
pub struct ListProfiles {
  /// Format of the printed profiles
  #[arg(long, value_enum, default_value_t)]
  pub output: OutputFormat,
}

fn yes_no(value: bool) -> &'static str {
  if value {
    "yes"
  } else {
    "no"
  }
}

/// Render profiles in resolution order as a text table
fn profiles_table(profiles: &[Profile]) -> String {
  let mut builder = Builder::default();
  builder.push_record(["Name", "Region", "Default", "Active"]);
  for profile in profiles {
    builder.push_record([
      profile.name.clone(),
      utils::or_missing(profile.region.as_deref()),
      yes_no(profile.is_default).to_owned(),
      yes_no(profile.is_from_env).to_owned(),
    ]);
  }

  let mut table = builder.build();
  table.with(Style::psql());
  table.to_string()
}

impl ListProfiles {
  pub async fn print(&self, global: &GlobalArgs) -> Result<()> {
    let sources = global.sources()?;
    debug!("Reading profiles from {:?}", sources);
    let profiles = global.profiles(&sources)?;

    match self.output {
      OutputFormat::Table => println!("{}", profiles_table(&profiles)),
      OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profiles)?),
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_renders_profiles_table() {
    let profiles = vec![
      Profile {
        name: "default".to_owned(),
        region: Some("us-east-1".to_owned()),
        is_default: true,
        is_from_env: false,
      },
      Profile {
        name: "staging".to_owned(),
        region: None,
        is_default: false,
        is_from_env: true,
      },
    ];
    let rendered = profiles_table(&profiles);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("Region"));
    assert!(lines[2].contains("default") && lines[2].contains("us-east-1"));
    assert!(lines[3].contains("staging") && lines[3].contains(" - "));
    assert!(lines[3].trim_end().ends_with("yes"));
  }
}
