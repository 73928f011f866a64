pub mod cli;
pub mod commands;
pub mod ec2;
pub mod ecr;
pub mod error;
pub mod ini;
pub mod lambda;
pub mod profile;
pub mod resource;
pub mod secrets;
pub mod ui;
pub mod utils;

pub use cli::{Cli, Commands};
pub use error::Error;
pub use profile::{lookup_configuration, resolve_profiles, Profile, ProfileSources};
pub use resource::ResourceKind;
