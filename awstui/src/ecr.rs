use anyhow::{anyhow, Result};
use aws_config::SdkConfig;
use aws_sdk_ecr::{
  config::{self, retry::RetryConfig},
  types, Client,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::utils;

/// Maximum number of images included when describing a repository
const DETAIL_MAX_IMAGES: i32 = 100;

/// Get the ECR client
fn get_client(config: &SdkConfig) -> Client {
  Client::from_conf(
    config::Builder::from(config)
      .retry_config(RetryConfig::standard().with_max_attempts(3))
      .build(),
  )
}

/// Summary of an ECR repository as shown in the resource table
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Repository {
  pub name: String,
  pub uri: String,
  pub image_count: usize,
  pub created_at: Option<DateTime<Utc>>,
}

impl Repository {
  fn new(repository: &types::Repository, image_count: usize) -> Self {
    Repository {
      name: repository.repository_name().unwrap_or_default().to_owned(),
      uri: repository.repository_uri().unwrap_or_default().to_owned(),
      image_count,
      created_at: repository.created_at().and_then(utils::to_utc),
    }
  }
}

/// Count every image stored in the repository
async fn count_images(client: &Client, name: &str) -> Result<usize> {
  let mut pages = client.describe_images().repository_name(name).into_paginator().send();

  let mut count = 0;
  while let Some(page) = pages.next().await {
    count += page?.image_details().len();
  }

  Ok(count)
}

/// List the repositories in the registry along with their image counts
///
/// Repositories whose images cannot be listed are left out rather than failing the whole listing
pub async fn list_repositories(config: &SdkConfig) -> Result<Vec<Repository>> {
  let client = get_client(config);
  let mut pages = client.describe_repositories().into_paginator().send();

  let mut repositories = Vec::new();
  while let Some(page) = pages.next().await {
    let page = page?;
    for repository in page.repositories() {
      let name = repository.repository_name().unwrap_or_default();
      match count_images(&client, name).await {
        Ok(count) => repositories.push(Repository::new(repository, count)),
        Err(err) => warn!("Skipping repository {name}: {err}"),
      }
    }
  }
  debug!("Found {} ECR repositories", repositories.len());

  Ok(repositories)
}

#[derive(Debug, Serialize)]
struct RepositoryDetail {
  name: Option<String>,
  arn: Option<String>,
  registry_id: Option<String>,
  uri: Option<String>,
  created_at: Option<String>,
  image_tag_mutability: Option<String>,
  scan_on_push: Option<bool>,
  images: Vec<ImageDetail>,
}

#[derive(Debug, Serialize)]
struct ImageDetail {
  digest: Option<String>,
  tags: Vec<String>,
  size_in_bytes: Option<i64>,
  pushed_at: Option<String>,
}

fn format_sdk_timestamp(value: Option<&aws_sdk_ecr::primitives::DateTime>) -> Option<String> {
  value
    .and_then(utils::to_utc)
    .map(|ts| utils::format_timestamp(Some(&ts)))
}

impl From<&types::ImageDetail> for ImageDetail {
  fn from(image: &types::ImageDetail) -> Self {
    ImageDetail {
      digest: image.image_digest().map(str::to_owned),
      tags: image.image_tags().to_vec(),
      size_in_bytes: image.image_size_in_bytes(),
      pushed_at: format_sdk_timestamp(image.image_pushed_at()),
    }
  }
}

impl RepositoryDetail {
  fn new(repository: &types::Repository, images: &[types::ImageDetail]) -> Self {
    RepositoryDetail {
      name: repository.repository_name().map(str::to_owned),
      arn: repository.repository_arn().map(str::to_owned),
      registry_id: repository.registry_id().map(str::to_owned),
      uri: repository.repository_uri().map(str::to_owned),
      created_at: format_sdk_timestamp(repository.created_at()),
      image_tag_mutability: repository.image_tag_mutability().map(|m| m.as_str().to_owned()),
      scan_on_push: repository.image_scanning_configuration().map(|c| c.scan_on_push()),
      images: images.iter().map(ImageDetail::from).collect(),
    }
  }
}

/// Describe a repository and its most recent images, rendered as pretty JSON
pub async fn describe_repository(config: &SdkConfig, name: &str) -> Result<String> {
  let client = get_client(config);
  let response = client.describe_repositories().repository_names(name).send().await?;
  let repository = response
    .repositories()
    .first()
    .ok_or_else(|| anyhow!("Repository not found: {name}"))?;

  let images = client
    .describe_images()
    .repository_name(name)
    .max_results(DETAIL_MAX_IMAGES)
    .send()
    .await?;

  let detail = RepositoryDetail::new(repository, images.image_details());
  Ok(serde_json::to_string_pretty(&detail)?)
}
