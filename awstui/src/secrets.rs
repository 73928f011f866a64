use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::{
  config::{self, retry::RetryConfig},
  primitives::DateTime as SdkDateTime,
  types, Client,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::utils;

/// Get the Secrets Manager client
fn get_client(config: &SdkConfig) -> Client {
  Client::from_conf(
    config::Builder::from(config)
      .retry_config(RetryConfig::standard().with_max_attempts(3))
      .build(),
  )
}

/// Summary of a secret as shown in the resource table; never includes the secret value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Secret {
  pub name: String,
  pub arn: String,
  pub last_modified: Option<DateTime<Utc>>,
  /// `None` when the secret has no scheduled rotation
  pub days_until_rotation: Option<i64>,
}

impl Secret {
  fn new(entry: &types::SecretListEntry, now: &DateTime<Utc>) -> Self {
    Secret {
      name: entry.name().unwrap_or_default().to_owned(),
      arn: entry.arn().unwrap_or_default().to_owned(),
      last_modified: entry.last_changed_date().and_then(utils::to_utc),
      days_until_rotation: entry
        .next_rotation_date()
        .and_then(utils::to_utc)
        .map(|next| utils::days_until(&next, now)),
    }
  }
}

pub async fn list_secrets(config: &SdkConfig) -> Result<Vec<Secret>> {
  let client = get_client(config);
  let mut pages = client.list_secrets().into_paginator().send();
  let now = Utc::now();

  let mut secrets = Vec::new();
  while let Some(page) = pages.next().await {
    secrets.extend(page?.secret_list().iter().map(|entry| Secret::new(entry, &now)));
  }
  debug!("Found {} secret(s)", secrets.len());

  Ok(secrets)
}

#[derive(Debug, Serialize)]
struct SecretDetail {
  name: Option<String>,
  arn: Option<String>,
  description: Option<String>,
  kms_key_id: Option<String>,
  rotation_enabled: Option<bool>,
  rotation_lambda_arn: Option<String>,
  created: Option<String>,
  last_changed: Option<String>,
  last_accessed: Option<String>,
  last_rotated: Option<String>,
  next_rotation: Option<String>,
  policy: Option<serde_json::Value>,
  tags: BTreeMap<String, String>,
}

fn format_sdk_timestamp(value: Option<&SdkDateTime>) -> Option<String> {
  value
    .and_then(utils::to_utc)
    .map(|ts| utils::format_timestamp(Some(&ts)))
}

impl SecretDetail {
  fn new(secret: &aws_sdk_secretsmanager::operation::describe_secret::DescribeSecretOutput) -> Self {
    SecretDetail {
      name: secret.name().map(str::to_owned),
      arn: secret.arn().map(str::to_owned),
      description: secret.description().map(str::to_owned),
      kms_key_id: secret.kms_key_id().map(str::to_owned),
      rotation_enabled: secret.rotation_enabled(),
      rotation_lambda_arn: secret.rotation_lambda_arn().map(str::to_owned),
      created: format_sdk_timestamp(secret.created_date()),
      last_changed: format_sdk_timestamp(secret.last_changed_date()),
      last_accessed: format_sdk_timestamp(secret.last_accessed_date()),
      last_rotated: format_sdk_timestamp(secret.last_rotated_date()),
      next_rotation: format_sdk_timestamp(secret.next_rotation_date()),
      policy: None,
      tags: secret
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?.to_owned(), t.value().unwrap_or_default().to_owned())))
        .collect(),
    }
  }
}

/// Describe a secret's metadata and resource policy, rendered as pretty JSON
///
/// The secret value is deliberately excluded, see [`get_secret_value`]
pub async fn describe_secret(config: &SdkConfig, secret_id: &str) -> Result<String> {
  let client = get_client(config);
  let response = client.describe_secret().secret_id(secret_id).send().await?;
  let mut detail = SecretDetail::new(&response);

  match client.get_resource_policy().secret_id(secret_id).send().await {
    Ok(policy) => {
      detail.policy = policy
        .resource_policy()
        .map(|p| serde_json::from_str(p).unwrap_or_else(|_| serde_json::Value::String(p.to_owned())))
    }
    Err(err) => debug!("No resource policy for {secret_id}: {err}"),
  }

  Ok(serde_json::to_string_pretty(&detail)?)
}

/// Retrieve the current secret string
pub async fn get_secret_value(config: &SdkConfig, secret_id: &str) -> Result<String> {
  let client = get_client(config);
  let response = client.get_secret_value().secret_id(secret_id).send().await?;

  response
    .secret_string()
    .map(str::to_owned)
    .ok_or_else(|| anyhow!("Secret {secret_id} holds binary data which is not displayed"))
}
