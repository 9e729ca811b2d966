use crate::error::BootstrapError;
use crate::models::Task;
use reqwest::Client;
use std::path::PathBuf;

/// Location of the static resource that seeds the task list on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapSource {
    Url(String),
    Path(PathBuf),
}

impl BootstrapSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            BootstrapSource::Url(raw.to_string())
        } else {
            BootstrapSource::Path(PathBuf::from(raw))
        }
    }
}

pub struct BootstrapLoader {
    source: Option<BootstrapSource>,
    client: Client,
}

impl BootstrapLoader {
    pub fn new(source: Option<BootstrapSource>) -> Self {
        Self {
            source,
            client: Client::new(),
        }
    }

    #[cfg(test)]
    pub fn with_client(source: Option<BootstrapSource>, client: Client) -> Self {
        Self { source, client }
    }

    pub fn source(&self) -> Option<&BootstrapSource> {
        self.source.as_ref()
    }

    /// Single attempt, no retry and no timeout.
    pub async fn fetch(&self) -> Result<Vec<Task>, BootstrapError> {
        match &self.source {
            None => Err(BootstrapError::NoSource),
            Some(BootstrapSource::Url(url)) => fetch_tasks(&self.client, url).await,
            Some(BootstrapSource::Path(path)) => {
                let content = tokio::fs::read(path)
                    .await
                    .map_err(|source| BootstrapError::Io {
                        path: path.clone(),
                        source,
                    })?;
                Ok(serde_json::from_slice(&content)?)
            }
        }
    }
}

pub async fn fetch_tasks(client: &Client, url: &str) -> Result<Vec<Task>, BootstrapError> {
    let res = client.get(url).send().await?;

    if res.status().is_success() {
        let body = res.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    } else {
        Err(BootstrapError::Status(res.status()))
    }
}
