use async_trait::async_trait;

use newsfeed_common::Publication;

use crate::error::{ClientError, Result};
use crate::ContentService;

pub struct ContentClient {
    client: reqwest::Client,
    base_url: String,
}

impl ContentClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self { client, base_url: base_url.into() }
    }
}

#[async_trait]
impl ContentService for ContentClient {
    async fn publications(
        &self,
        cursor: Option<&str>,
        take: usize,
    ) -> Result<(Vec<Publication>, Option<String>)> {
        let url = format!(
            "{}/publications?cursor={}&take={}",
            self.base_url,
            cursor.unwrap_or(""),
            take
        );
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        // The content service hands the next-page cursor back in a header.
        let next_cursor = resp
            .headers()
            .get("X-Cursor")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let publications: Vec<Publication> = resp.json().await?;
        Ok((publications, next_cursor))
    }
}
