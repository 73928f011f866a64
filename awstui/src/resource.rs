use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use aws_config::SdkConfig;
use clap::ValueEnum;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::{ec2, ecr, lambda, secrets, utils};

/// The kinds of resources that can be browsed
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
  /// EC2 instances
  Ec2,
  /// ECR repositories
  Ecr,
  /// Lambda functions
  Lambda,
  /// Secrets Manager secrets
  Secrets,
}

/// A table column and the maximum width it is given in the terminal UI
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Column {
  pub title: &'static str,
  pub width: u16,
}

const fn column(title: &'static str, width: u16) -> Column {
  Column { title, width }
}

const EC2_COLUMNS: &[Column] = &[
  column("ID", 20),
  column("Name", 30),
  column("Type", 15),
  column("State", 10),
  column("Private IP", 15),
  column("Public IP", 15),
];

const ECR_COLUMNS: &[Column] = &[
  column("Name", 40),
  column("URI", 60),
  column("Images", 10),
  column("Created", 20),
];

const LAMBDA_COLUMNS: &[Column] = &[
  column("Name", 40),
  column("Runtime", 15),
  column("Memory", 10),
  column("Last Modified", 20),
];

const SECRETS_COLUMNS: &[Column] = &[
  column("Name", 40),
  column("Last Modified", 20),
  column("Days Until Rotation", 20),
];

impl ResourceKind {
  pub const ALL: [ResourceKind; 4] = [Self::Ec2, Self::Ecr, Self::Lambda, Self::Secrets];

  /// Short name used on the command line and in quick navigation
  pub fn key(&self) -> &'static str {
    match self {
      Self::Ec2 => "ec2",
      Self::Ecr => "ecr",
      Self::Lambda => "lambda",
      Self::Secrets => "secrets",
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      Self::Ec2 => "EC2 Instances",
      Self::Ecr => "ECR Repositories",
      Self::Lambda => "Lambda Functions",
      Self::Secrets => "Secrets Manager",
    }
  }

  pub fn columns(&self) -> &'static [Column] {
    match self {
      Self::Ec2 => EC2_COLUMNS,
      Self::Ecr => ECR_COLUMNS,
      Self::Lambda => LAMBDA_COLUMNS,
      Self::Secrets => SECRETS_COLUMNS,
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.key())
  }
}

impl FromStr for ResourceKind {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    let key = s.trim().to_ascii_lowercase();
    Self::ALL
      .into_iter()
      .find(|kind| kind.key() == key)
      .ok_or_else(|| anyhow!("Unknown resource type: {}", s.trim()))
  }
}

/// Resources returned from a listing, one variant per kind
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Resources {
  Ec2(Vec<ec2::Instance>),
  Ecr(Vec<ecr::Repository>),
  Lambda(Vec<lambda::Function>),
  Secrets(Vec<secrets::Secret>),
}

/// A row of rendered cells along with the identifier used to describe the resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
  pub key: String,
  pub cells: Vec<String>,
}

/// Resources rendered as text cells, ready for the terminal UI or the CLI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceTable {
  pub kind: ResourceKind,
  pub rows: Vec<TableRow>,
}

impl Resources {
  pub fn kind(&self) -> ResourceKind {
    match self {
      Self::Ec2(_) => ResourceKind::Ec2,
      Self::Ecr(_) => ResourceKind::Ecr,
      Self::Lambda(_) => ResourceKind::Lambda,
      Self::Secrets(_) => ResourceKind::Secrets,
    }
  }

  pub fn table(&self) -> ResourceTable {
    let rows = match self {
      Self::Ec2(instances) => instances
        .iter()
        .map(|i| TableRow {
          key: i.id.clone(),
          cells: vec![
            i.id.clone(),
            i.name.clone(),
            i.instance_type.clone(),
            i.state.clone(),
            i.private_ip.clone(),
            i.public_ip.clone(),
          ],
        })
        .collect(),
      Self::Ecr(repositories) => repositories
        .iter()
        .map(|r| TableRow {
          key: r.name.clone(),
          cells: vec![
            r.name.clone(),
            r.uri.clone(),
            r.image_count.to_string(),
            utils::format_timestamp(r.created_at.as_ref()),
          ],
        })
        .collect(),
      Self::Lambda(functions) => functions
        .iter()
        .map(|f| TableRow {
          key: f.name.clone(),
          cells: vec![
            f.name.clone(),
            f.runtime.clone(),
            f.memory_size.map_or_else(|| utils::MISSING.to_owned(), |m| m.to_string()),
            utils::format_timestamp(f.last_modified.as_ref()),
          ],
        })
        .collect(),
      Self::Secrets(secrets) => secrets
        .iter()
        .map(|s| TableRow {
          key: if s.arn.is_empty() { s.name.clone() } else { s.arn.clone() },
          cells: vec![
            s.name.clone(),
            utils::format_timestamp(s.last_modified.as_ref()),
            s.days_until_rotation
              .map_or_else(|| utils::MISSING.to_owned(), |d| d.to_string()),
          ],
        })
        .collect(),
    };

    ResourceTable { kind: self.kind(), rows }
  }
}

impl ResourceTable {
  pub fn header(&self) -> Vec<&'static str> {
    self.kind.columns().iter().map(|c| c.title).collect()
  }

  /// Render as a plain text table for the terminal
  pub fn render(&self) -> String {
    let mut builder = Builder::default();
    builder.push_record(self.header());
    for row in &self.rows {
      builder.push_record(row.cells.clone());
    }

    let mut table = builder.build();
    table.with(Style::psql());
    table.to_string()
  }
}

/// List every resource of the given kind
pub async fn list_resources(kind: ResourceKind, config: &SdkConfig) -> Result<Resources> {
  let resources = match kind {
    ResourceKind::Ec2 => Resources::Ec2(ec2::list_instances(config).await?),
    ResourceKind::Ecr => Resources::Ecr(ecr::list_repositories(config).await?),
    ResourceKind::Lambda => Resources::Lambda(lambda::list_functions(config).await?),
    ResourceKind::Secrets => Resources::Secrets(secrets::list_secrets(config).await?),
  };

  Ok(resources)
}

/// Describe a single resource, identified by the key of its table row
pub async fn describe_resource(kind: ResourceKind, config: &SdkConfig, key: &str) -> Result<String> {
  match kind {
    ResourceKind::Ec2 => ec2::describe_instance(config, key).await,
    ResourceKind::Ecr => ecr::describe_repository(config, key).await,
    ResourceKind::Lambda => lambda::describe_function(config, key).await,
    ResourceKind::Secrets => secrets::describe_secret(config, key).await,
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use rstest::*;

  use super::*;

  #[rstest]
  #[case("ec2", ResourceKind::Ec2)]
  #[case("ECR", ResourceKind::Ecr)]
  #[case(" lambda ", ResourceKind::Lambda)]
  #[case("Secrets", ResourceKind::Secrets)]
  fn it_parses_resource_kinds(#[case] input: &str, #[case] expected: ResourceKind) {
    assert_eq!(input.parse::<ResourceKind>().unwrap(), expected);
  }

  #[rstest]
  #[case("s3")]
  #[case("")]
  #[case("ec2 instances")]
  fn it_rejects_unknown_kinds(#[case] input: &str) {
    let err = input.parse::<ResourceKind>().unwrap_err();
    assert_eq!(err.to_string(), format!("Unknown resource type: {}", input.trim()));
  }

  #[test]
  fn it_round_trips_keys() {
    for kind in ResourceKind::ALL {
      assert_eq!(kind.to_string().parse::<ResourceKind>().unwrap(), kind);
    }
  }

  #[test]
  fn it_renders_secrets_rows() {
    let resources = Resources::Secrets(vec![
      secrets::Secret {
        name: "prod/db".to_owned(),
        arn: "arn:aws:secretsmanager:us-east-1:123456789012:secret:prod/db".to_owned(),
        last_modified: Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).single(),
        days_until_rotation: Some(12),
      },
      secrets::Secret {
        name: "static".to_owned(),
        arn: String::new(),
        last_modified: None,
        days_until_rotation: None,
      },
    ]);
    let table = resources.table();

    assert_eq!(table.header(), vec!["Name", "Last Modified", "Days Until Rotation"]);
    assert_eq!(table.rows[0].cells, vec!["prod/db", "2024-02-03 04:05:06", "12"]);
    assert_eq!(table.rows[0].key, "arn:aws:secretsmanager:us-east-1:123456789012:secret:prod/db");
    assert_eq!(table.rows[1].cells, vec!["static", "-", "-"]);
    assert_eq!(table.rows[1].key, "static");
  }

  #[test]
  fn it_renders_text_tables() {
    let resources = Resources::Lambda(vec![lambda::Function {
      name: "orders-handler".to_owned(),
      runtime: "python3.12".to_owned(),
      memory_size: Some(256),
      last_modified: None,
    }]);
    let rendered = resources.table().render();

    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Name") && lines[0].contains("Last Modified"));
    assert!(lines[2].contains("orders-handler") && lines[2].contains("256"));
  }

  #[test]
  fn it_serializes_resources_as_plain_lists() {
    let resources = Resources::Ecr(vec![ecr::Repository {
      name: "api".to_owned(),
      uri: "123456789012.dkr.ecr.us-east-1.amazonaws.com/api".to_owned(),
      image_count: 3,
      created_at: None,
    }]);
    let value = serde_json::to_value(&resources).unwrap();

    assert_eq!(value[0]["name"], "api");
    assert_eq!(value[0]["image_count"], 3);
  }
}
