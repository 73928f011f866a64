use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;

use crate::{
  commands,
  profile::{self, Profile, ProfileSources},
};

/// Styles for CLI
fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .literal(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::BrightCyan))),
    )
    .usage(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
}

#[derive(Debug, Parser)]
#[command(author, about, version)]
#[command(propagate_version = true)]
#[command(styles=get_styles())]
pub struct Cli {
  /// Defaults to launching the terminal UI
  #[command(subcommand)]
  pub command: Option<Commands>,

  #[clap(flatten)]
  pub global: GlobalArgs,

  /// Write logs to this file; the terminal UI discards logs otherwise
  #[arg(long, global = true)]
  pub log_file: Option<PathBuf>,

  /// Disable colored log output
  #[arg(long, global = true)]
  pub no_color: bool,

  #[clap(flatten)]
  pub verbose: Verbosity,
}

/// Where profiles are read from and how SDK clients are configured
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
  /// Path of the shared config file [default: ~/.aws/config]
  #[arg(long, global = true, env = "AWS_CONFIG_FILE")]
  pub config_file: Option<PathBuf>,

  /// Path of the shared credentials file [default: ~/.aws/credentials]
  #[arg(long, global = true, env = "AWS_SHARED_CREDENTIALS_FILE")]
  pub credentials_file: Option<PathBuf>,

  /// Region used for AWS API calls, overriding the profile's region
  #[arg(long, global = true, env = "AWS_REGION")]
  pub region: Option<String>,

  /// Profile marked as active in the profile list
  #[arg(long, global = true, env = "AWS_PROFILE")]
  pub active_profile: Option<String>,
}

impl GlobalArgs {
  pub fn sources(&self) -> Result<ProfileSources> {
    Ok(ProfileSources::discover(
      self.config_file.clone(),
      self.credentials_file.clone(),
    )?)
  }

  /// Resolve the profiles from both sources, flagging the active profile
  pub fn profiles(&self, sources: &ProfileSources) -> Result<Vec<Profile>> {
    Ok(profile::resolve_profiles(sources, self.active_profile.as_deref())?)
  }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Browse profiles and resources in the terminal UI
  Ui(commands::ui::Ui),

  /// Print the profiles resolved from the shared config and credentials files
  Profiles(commands::profiles::ListProfiles),

  /// Print the resources of one kind visible to a profile
  List(commands::list::ListResources),

  /// Print the details of a single resource as JSON
  ///
  /// Secret values are only retrieved when `--reveal` is given
  Describe(commands::describe::DescribeResource),
}
