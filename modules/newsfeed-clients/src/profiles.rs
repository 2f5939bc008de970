use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ClientError, Result};
use crate::ProfileDirectory;

/// A user profile from the upstream directory. Only the id matters to the
/// migrator; the names ride along for logging.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

pub struct ProfilesClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProfilesClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[async_trait]
impl ProfileDirectory for ProfilesClient {
    async fn profiles(&self, skip: usize, take: usize) -> Result<Vec<Profile>> {
        let url = format!("{}/profiles?skip={}&take={}", self.base_url, skip, take);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        Ok(resp.json().await?)
    }
}
