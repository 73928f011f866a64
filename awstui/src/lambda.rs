use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use aws_config::SdkConfig;
use aws_sdk_lambda::{
  config::{self, retry::RetryConfig},
  types, Client,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::utils;

/// Get the Lambda client
fn get_client(config: &SdkConfig) -> Client {
  Client::from_conf(
    config::Builder::from(config)
      .retry_config(RetryConfig::standard().with_max_attempts(3))
      .build(),
  )
}

/// Summary of a Lambda function as shown in the resource table
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Function {
  pub name: String,
  pub runtime: String,
  /// Memory in MB
  pub memory_size: Option<i32>,
  pub last_modified: Option<DateTime<Utc>>,
}

impl From<&types::FunctionConfiguration> for Function {
  fn from(function: &types::FunctionConfiguration) -> Self {
    Function {
      name: function.function_name().unwrap_or_default().to_owned(),
      // Container image functions have no runtime
      runtime: function
        .runtime()
        .map(|r| r.as_str().to_owned())
        .unwrap_or_else(|| utils::MISSING.to_owned()),
      memory_size: function.memory_size(),
      last_modified: function.last_modified().and_then(utils::parse_lambda_timestamp),
    }
  }
}

pub async fn list_functions(config: &SdkConfig) -> Result<Vec<Function>> {
  let client = get_client(config);
  let mut pages = client.list_functions().into_paginator().send();

  let mut functions = Vec::new();
  while let Some(page) = pages.next().await {
    functions.extend(page?.functions().iter().map(Function::from));
  }
  debug!("Found {} Lambda function(s)", functions.len());

  Ok(functions)
}

#[derive(Debug, Serialize)]
struct FunctionDetail {
  name: Option<String>,
  arn: Option<String>,
  description: Option<String>,
  runtime: Option<String>,
  handler: Option<String>,
  role: Option<String>,
  package_type: Option<String>,
  architectures: Vec<String>,
  memory_size: Option<i32>,
  timeout: Option<i32>,
  code_size: i64,
  state: Option<String>,
  last_modified: Option<String>,
  reserved_concurrency: Option<i32>,
  policy: Option<serde_json::Value>,
  tags: BTreeMap<String, String>,
}

impl FunctionDetail {
  fn new(function: &types::FunctionConfiguration) -> Self {
    FunctionDetail {
      name: function.function_name().map(str::to_owned),
      arn: function.function_arn().map(str::to_owned),
      description: function.description().filter(|d| !d.is_empty()).map(str::to_owned),
      runtime: function.runtime().map(|r| r.as_str().to_owned()),
      handler: function.handler().map(str::to_owned),
      role: function.role().map(str::to_owned),
      package_type: function.package_type().map(|p| p.as_str().to_owned()),
      architectures: function.architectures().iter().map(|a| a.as_str().to_owned()).collect(),
      memory_size: function.memory_size(),
      timeout: function.timeout(),
      code_size: function.code_size(),
      state: function.state().map(|s| s.as_str().to_owned()),
      last_modified: function
        .last_modified()
        .and_then(utils::parse_lambda_timestamp)
        .map(|ts| utils::format_timestamp(Some(&ts))),
      reserved_concurrency: None,
      policy: None,
      tags: BTreeMap::new(),
    }
  }
}

/// Resource policies are JSON documents; keep the raw string if it does not parse
fn policy_document(policy: &str) -> serde_json::Value {
  serde_json::from_str(policy).unwrap_or_else(|_| serde_json::Value::String(policy.to_owned()))
}

/// Describe a function with its resource policy and reserved concurrency, rendered as pretty JSON
///
/// The policy and concurrency are optional; functions without them are common and their
/// lookups failing does not fail the description.
pub async fn describe_function(config: &SdkConfig, name: &str) -> Result<String> {
  let client = get_client(config);
  let response = client.get_function().function_name(name).send().await?;
  let function = response
    .configuration()
    .ok_or_else(|| anyhow!("Function not found: {name}"))?;

  let mut detail = FunctionDetail::new(function);
  if let Some(tags) = response.tags() {
    detail.tags = tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
  }

  match client.get_policy().function_name(name).send().await {
    Ok(policy) => detail.policy = policy.policy().map(policy_document),
    Err(err) => debug!("No resource policy for {name}: {err}"),
  }

  match client.get_function_concurrency().function_name(name).send().await {
    Ok(concurrency) => detail.reserved_concurrency = concurrency.reserved_concurrent_executions(),
    Err(err) => debug!("No reserved concurrency for {name}: {err}"),
  }

  Ok(serde_json::to_string_pretty(&detail)?)
}
