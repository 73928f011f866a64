//! Discovery of the named AWS profiles available to the current user
//!
//! Profiles are declared across two files that follow different conventions:
//!
//! - the config file (`~/.aws/config`) names its sections `[default]` or `[profile <name>]` and
//!   carries non-secret settings such as `region`
//! - the credentials file (`~/.aws/credentials`) names its sections after the profile directly
//!   and carries secret material only
//!
//! Both files are parsed into the same [`RawEntry`] shape and folded into a single, de-duplicated
//! list of [`Profile`]s. Nothing is cached; every call re-reads the files.
use std::{
  collections::HashMap,
  fs, io,
  path::{Path, PathBuf},
};

use aws_config::{
  profile::profile_file::{ProfileFileKind, ProfileFiles},
  BehaviorVersion, SdkConfig,
};
use aws_types::region::Region;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
  error::{Error, SourceError},
  ini,
};

/// Section prefix that marks a profile in the config file
const PROFILE_PREFIX: &str = "profile ";

pub const DEFAULT_PROFILE: &str = "default";

/// A named identity resolved from the local profile sources
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Profile {
  pub name: String,
  pub region: Option<String>,
  /// The profile is named `default` in at least one source
  pub is_default: bool,
  /// The profile is the one selected through the `AWS_PROFILE` override
  pub is_from_env: bool,
}

impl Profile {
  /// Display label, e.g. `dev (region: us-west-2) [default] [active]`
  pub fn label(&self) -> String {
    let mut label = self.name.clone();
    if let Some(region) = &self.region {
      label.push_str(&format!(" (region: {region})"));
    }
    if self.is_default {
      label.push_str(" [default]");
    }
    if self.is_from_env {
      label.push_str(" [active]");
    }
    label
  }
}

/// A profile as declared by a single source, before merging
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEntry {
  pub name: String,
  pub region: Option<String>,
  pub is_default: bool,
}

impl RawEntry {
  fn new(name: &str, region: Option<&str>) -> Self {
    RawEntry {
      name: name.to_owned(),
      region: region.filter(|r| !r.is_empty()).map(str::to_owned),
      is_default: name == DEFAULT_PROFILE,
    }
  }
}

/// Locations of the config-style and credentials-style profile sources
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileSources {
  pub config: PathBuf,
  pub credentials: PathBuf,
}

impl ProfileSources {
  pub fn new<C: Into<PathBuf>, P: Into<PathBuf>>(config: C, credentials: P) -> Self {
    ProfileSources {
      config: config.into(),
      credentials: credentials.into(),
    }
  }

  /// Resolve the source locations, falling back to `~/.aws/config` and `~/.aws/credentials`
  ///
  /// Fails only when a default location is needed and the home directory cannot be determined.
  /// Whether the files exist is not checked here.
  pub fn discover(config: Option<PathBuf>, credentials: Option<PathBuf>) -> Result<Self, Error> {
    Self::discover_in(dirs::home_dir(), config, credentials)
  }

  /// Resolve the source locations against the given home directory
  fn discover_in(home: Option<PathBuf>, config: Option<PathBuf>, credentials: Option<PathBuf>) -> Result<Self, Error> {
    let aws_dir = || home.as_ref().map(|home| home.join(".aws")).ok_or(Error::Configuration);

    let config = match config {
      Some(path) => path,
      None => aws_dir()?.join("config"),
    };
    let credentials = match credentials {
      Some(path) => path,
      None => aws_dir()?.join("credentials"),
    };

    Ok(ProfileSources { config, credentials })
  }

  /// The same sources, in the form the SDK configuration loader accepts
  pub fn profile_files(&self) -> ProfileFiles {
    ProfileFiles::builder()
      .with_file(ProfileFileKind::Config, self.config.clone())
      .with_file(ProfileFileKind::Credentials, self.credentials.clone())
      .build()
  }
}

/// Read and parse a source; a file that does not exist yields `None`
fn read_source(path: &Path) -> Result<Option<ini::Document>, Error> {
  let contents = match fs::read_to_string(path) {
    Ok(contents) => contents,
    Err(err) if err.kind() == io::ErrorKind::NotFound => {
      debug!("Profile source {} not found - skipping", path.display());
      return Ok(None);
    }
    Err(err) => {
      return Err(Error::SourceRead {
        path: path.to_owned(),
        source: SourceError::Io(err),
      })
    }
  };

  let doc = ini::parse(&contents).map_err(|err| Error::SourceRead {
    path: path.to_owned(),
    source: SourceError::Parse(err),
  })?;

  Ok(Some(doc))
}

fn named_sections(doc: &ini::Document) -> impl Iterator<Item = &ini::Section> {
  doc
    .sections()
    .iter()
    .filter(|s| s.name() != ini::GLOBAL_DEFAULTS_SECTION)
}

/// Entries declared in a config-style source
///
/// Only `[default]` and `[profile <name>]` sections are profiles; anything else
/// (`[sso-session x]`, `[services y]`, ...) is ignored.
pub fn config_entries(doc: &ini::Document) -> Vec<RawEntry> {
  named_sections(doc)
    .filter_map(|section| {
      let name = match section.name() {
        DEFAULT_PROFILE => DEFAULT_PROFILE,
        other => other.strip_prefix(PROFILE_PREFIX)?.trim(),
      };
      if name.is_empty() {
        return None;
      }
      Some(RawEntry::new(name, section.get("region")))
    })
    .collect()
}

/// Entries declared in a credentials-style source; every section is a profile and carries no region
pub fn credentials_entries(doc: &ini::Document) -> Vec<RawEntry> {
  named_sections(doc).map(|section| RawEntry::new(section.name(), None)).collect()
}

/// Fold raw entries into unique profiles keyed by name
///
/// The first occurrence of a name fixes its position. Later occurrences may only fill in a region
/// (an empty region never replaces a known one) and turn `is_default` on.
pub fn merge_entries<I: IntoIterator<Item = RawEntry>>(entries: I) -> Vec<Profile> {
  let mut seen: HashMap<String, usize> = HashMap::new();
  let mut profiles: Vec<Profile> = Vec::new();

  for entry in entries {
    match seen.get(&entry.name) {
      Some(&idx) => {
        let existing = &mut profiles[idx];
        if entry.region.is_some() {
          existing.region = entry.region;
        }
        existing.is_default |= entry.is_default;
      }
      None => {
        seen.insert(entry.name.clone(), profiles.len());
        profiles.push(Profile {
          name: entry.name,
          region: entry.region,
          is_default: entry.is_default,
          is_from_env: false,
        });
      }
    }
  }

  profiles
}

/// Flag the profile named by the environment override, if there is one
pub fn mark_from_env(profiles: &mut [Profile], env_override: Option<&str>) {
  let Some(name) = env_override.filter(|n| !n.is_empty()) else {
    return;
  };

  match profiles.iter_mut().find(|p| p.name == name) {
    Some(profile) => profile.is_from_env = true,
    None => debug!("Override profile {name} does not match any configured profile"),
  }
}

/// Resolve every profile declared across both sources
///
/// Missing files contribute nothing; an existing file that cannot be read or parsed fails the
/// whole resolution.
pub fn resolve_profiles(sources: &ProfileSources, env_override: Option<&str>) -> Result<Vec<Profile>, Error> {
  let mut entries = Vec::new();

  if let Some(doc) = read_source(&sources.config)? {
    entries.extend(config_entries(&doc));
  }
  if let Some(doc) = read_source(&sources.credentials)? {
    entries.extend(credentials_entries(&doc));
  }

  let mut profiles = merge_entries(entries);
  mark_from_env(&mut profiles, env_override);
  info!("Resolved {} profile(s)", profiles.len());

  Ok(profiles)
}

/// Get the SDK configuration for one of the resolved profiles
///
/// The region is taken from `region` when supplied, otherwise from the resolved profile; when
/// neither is set the SDK's own region chain applies.
pub async fn lookup_configuration(
  profiles: &[Profile],
  name: &str,
  sources: &ProfileSources,
  region: Option<String>,
) -> Result<SdkConfig, Error> {
  let profile = profiles
    .iter()
    .find(|p| p.name == name)
    .ok_or_else(|| Error::ProfileNotFound(name.to_owned()))?;

  let mut loader = aws_config::defaults(BehaviorVersion::latest())
    .profile_files(sources.profile_files())
    .profile_name(&profile.name);

  if let Some(region) = region.or_else(|| profile.region.clone()) {
    loader = loader.region(Region::new(region));
  }

  debug!("Loading SDK configuration for profile {name}");
  Ok(loader.load().await)
}
