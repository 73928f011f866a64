use anyhow::{bail, Result};
use clap::Args;
use serde_json::{json, Value};

use super::load_sdk_config;
use crate::{
  cli::GlobalArgs,
  resource::{self, ResourceKind},
  secrets,
};

/// Input arguments for `describe` command
#[derive(Args, Debug)]
pub struct DescribeResource {
  /// Kind of the resource
  #[arg(value_enum, ignore_case = true)]
  pub kind: ResourceKind,

  /// Identifier of the resource: instance ID, repository name, function name, or secret name/ARN
  pub id: String,

  /// Profile used to call AWS
  #[arg(long, env = "AWS_PROFILE")]
  pub profile: String,

  /// Include the secret value; only valid for secrets
  #[arg(long)]
  pub reveal: bool,
}

/// Attach the secret value to an already rendered description
fn with_secret_value(detail: &str, value: &str) -> Result<String> {
  let mut detail: Value = serde_json::from_str(detail)?;
  if let Value::Object(map) = &mut detail {
    map.insert("secret_string".to_owned(), json!(value));
  }

  Ok(serde_json::to_string_pretty(&detail)?)
}

impl DescribeResource {
  pub async fn print(&self, global: &GlobalArgs) -> Result<()> {
    if self.reveal && self.kind != ResourceKind::Secrets {
      bail!("--reveal is only supported for secrets");
    }

    let config = load_sdk_config(global, &self.profile).await?;
    let mut detail = resource::describe_resource(self.kind, &config, &self.id).await?;

    if self.reveal {
      let value = secrets::get_secret_value(&config, &self.id).await?;
      detail = with_secret_value(&detail, &value)?;
    }

    println!("{detail}");

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_attaches_secret_values() {
    let detail = r#"{"name": "prod/db", "rotation_enabled": true}"#;
    let result: Value = serde_json::from_str(&with_secret_value(detail, "hunter2").unwrap()).unwrap();

    assert_eq!(result["name"], "prod/db");
    assert_eq!(result["secret_string"], "hunter2");
  }
}
