use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use aws_config::SdkConfig;
use aws_sdk_ec2::{
  config::{self, retry::RetryConfig},
  types, Client,
};
use serde::Serialize;
use tracing::debug;

use crate::utils;

/// Get the EC2 client
fn get_client(config: &SdkConfig) -> Client {
  Client::from_conf(
    // Start with the profile's shared configuration
    config::Builder::from(config)
      .retry_config(RetryConfig::standard().with_max_attempts(3))
      .build(),
  )
}

/// Summary of an EC2 instance as shown in the resource table
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Instance {
  pub id: String,
  /// Value of the `Name` tag, empty when untagged
  pub name: String,
  pub instance_type: String,
  pub state: String,
  pub private_ip: String,
  pub public_ip: String,
}

fn name_tag(tags: &[types::Tag]) -> Option<&str> {
  tags
    .iter()
    .find(|tag| tag.key() == Some("Name"))
    .and_then(|tag| tag.value())
}

fn state_name(instance: &types::Instance) -> String {
  instance
    .state()
    .and_then(|s| s.name())
    .map(|n| n.as_str().to_owned())
    .unwrap_or_default()
}

impl From<&types::Instance> for Instance {
  fn from(instance: &types::Instance) -> Self {
    Instance {
      id: instance.instance_id().unwrap_or_default().to_owned(),
      name: name_tag(instance.tags()).unwrap_or_default().to_owned(),
      instance_type: instance
        .instance_type()
        .map(|t| t.as_str().to_owned())
        .unwrap_or_default(),
      state: state_name(instance),
      private_ip: utils::or_missing(instance.private_ip_address()),
      public_ip: utils::or_missing(instance.public_ip_address()),
    }
  }
}

/// List every instance visible to the profile, across all reservations
pub async fn list_instances(config: &SdkConfig) -> Result<Vec<Instance>> {
  let client = get_client(config);
  let mut pages = client.describe_instances().into_paginator().send();

  let mut instances = Vec::new();
  while let Some(page) = pages.next().await {
    let page = page?;
    for reservation in page.reservations() {
      instances.extend(reservation.instances().iter().map(Instance::from));
    }
  }
  debug!("Found {} EC2 instance(s)", instances.len());

  Ok(instances)
}

/// Detailed view of a single instance
#[derive(Debug, Serialize)]
struct InstanceDetail {
  id: String,
  name: Option<String>,
  instance_type: Option<String>,
  state: String,
  image_id: Option<String>,
  launch_time: Option<String>,
  availability_zone: Option<String>,
  vpc_id: Option<String>,
  subnet_id: Option<String>,
  private_ip: Option<String>,
  private_dns_name: Option<String>,
  public_ip: Option<String>,
  public_dns_name: Option<String>,
  key_name: Option<String>,
  architecture: Option<String>,
  platform: Option<String>,
  security_groups: Vec<String>,
  tags: BTreeMap<String, String>,
}

impl From<&types::Instance> for InstanceDetail {
  fn from(instance: &types::Instance) -> Self {
    let owned = |value: Option<&str>| value.map(str::to_owned);

    InstanceDetail {
      id: instance.instance_id().unwrap_or_default().to_owned(),
      name: owned(name_tag(instance.tags())),
      instance_type: instance.instance_type().map(|t| t.as_str().to_owned()),
      state: state_name(instance),
      image_id: owned(instance.image_id()),
      launch_time: instance
        .launch_time()
        .and_then(utils::to_utc)
        .map(|ts| utils::format_timestamp(Some(&ts))),
      availability_zone: owned(instance.placement().and_then(|p| p.availability_zone())),
      vpc_id: owned(instance.vpc_id()),
      subnet_id: owned(instance.subnet_id()),
      private_ip: owned(instance.private_ip_address()),
      private_dns_name: owned(instance.private_dns_name()).filter(|n| !n.is_empty()),
      public_ip: owned(instance.public_ip_address()),
      public_dns_name: owned(instance.public_dns_name()).filter(|n| !n.is_empty()),
      key_name: owned(instance.key_name()),
      architecture: instance.architecture().map(|a| a.as_str().to_owned()),
      platform: owned(instance.platform_details()),
      security_groups: instance
        .security_groups()
        .iter()
        .filter_map(|g| g.group_name().map(str::to_owned))
        .collect(),
      tags: instance
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?.to_owned(), t.value().unwrap_or_default().to_owned())))
        .collect(),
    }
  }
}

/// Describe a single instance, rendered as pretty JSON
pub async fn describe_instance(config: &SdkConfig, instance_id: &str) -> Result<String> {
  let client = get_client(config);
  let response = client.describe_instances().instance_ids(instance_id).send().await?;

  let instance = response
    .reservations()
    .first()
    .and_then(|r| r.instances().first())
    .ok_or_else(|| anyhow!("Instance not found: {instance_id}"))?;

  Ok(serde_json::to_string_pretty(&InstanceDetail::from(instance))?)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tag(key: &str, value: &str) -> types::Tag {
    types::Tag::builder().key(key).value(value).build()
  }

  fn running_instance() -> types::Instance {
    types::Instance::builder()
      .instance_id("i-0123456789abcdef0")
      .instance_type(types::InstanceType::from("t3.micro"))
      .state(
        types::InstanceState::builder()
          .name(types::InstanceStateName::Running)
          .build(),
      )
      .tags(tag("team", "platform"))
      .tags(tag("Name", "web-1"))
      .private_ip_address("10.0.1.15")
      .build()
  }

  #[test]
  fn it_summarizes_instances() {
    let result = Instance::from(&running_instance());

    assert_eq!(
      result,
      Instance {
        id: "i-0123456789abcdef0".to_owned(),
        name: "web-1".to_owned(),
        instance_type: "t3.micro".to_owned(),
        state: "running".to_owned(),
        private_ip: "10.0.1.15".to_owned(),
        public_ip: "-".to_owned(),
      }
    );
  }

  #[test]
  fn it_leaves_untagged_instances_unnamed() {
    let instance = types::Instance::builder().instance_id("i-1").build();
    let result = Instance::from(&instance);

    assert_eq!(result.name, "");
    assert_eq!(result.state, "");
    assert_eq!(result.private_ip, "-");
  }

  #[test]
  fn it_details_instances() {
    let detail = InstanceDetail::from(&running_instance());

    assert_eq!(detail.name.as_deref(), Some("web-1"));
    assert_eq!(detail.tags.get("team").map(String::as_str), Some("platform"));
    assert!(detail.public_ip.is_none());
    assert!(detail.security_groups.is_empty());
  }
}
