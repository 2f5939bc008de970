use async_trait::async_trait;

use crate::error::{ClientError, Result};
use crate::RelationsDirectory;

pub struct RelationsClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelationsClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self { client, base_url: base_url.into() }
    }

    async fn fetch_ids(&self, url: &str) -> Result<Vec<String>> {
        let resp = self.client.get(url).send().await?;

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

#[async_trait]
impl RelationsDirectory for RelationsClient {
    async fn friends(&self, user: &str, skip: usize, take: usize) -> Result<Vec<String>> {
        let url = format!(
            "{}/relations/{}/friends?skip={}&take={}",
            self.base_url, user, skip, take
        );
        self.fetch_ids(&url).await
    }

    async fn outgoing_requests(
        &self,
        user: &str,
        skip: usize,
        take: usize,
    ) -> Result<Vec<String>> {
        let url = format!(
            "{}/relations/{}/friends/outgoing-requests?skip={}&take={}",
            self.base_url, user, skip, take
        );
        self.fetch_ids(&url).await
    }
}
