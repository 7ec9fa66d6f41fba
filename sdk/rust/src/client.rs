use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A todo item as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Todo {
    /// Assigned by the server; ignored on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub due_date: Option<String>,
    pub text: String,
    pub done: bool,
}

impl Todo {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn due(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("todo {0} not found")]
    NotFound(String),

    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Thin wrapper over the service's HTTP surface.
pub struct TodoClient {
    client: Client,
    base_url: String,
    group_header: String,
    group: Option<String>,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            group_header: "x-group-id".to_string(),
            group: None,
        }
    }

    /// Send `group` in the tenant header on every request.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Use a header other than `x-group-id` for the tenant.
    pub fn with_group_header(mut self, header: impl Into<String>) -> Self {
        self.group_header = header.into();
        self
    }

    pub async fn list(&self) -> Result<Vec<Todo>, ClientError> {
        let resp = self.send(self.client.get(self.url("/todos"))).await?;
        Ok(resp.json().await?)
    }

    pub async fn create(&self, todo: &Todo) -> Result<Todo, ClientError> {
        let resp = self
            .send(self.client.post(self.url("/todos")).json(todo))
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Todo, ClientError> {
        let resp = self
            .send(self.client.get(self.url(&format!("/todos/{}", id))))
            .await
            .map_err(|e| not_found(e, id))?;
        Ok(resp.json().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.send(self.client.delete(self.url(&format!("/todos/{}", id))))
            .await
            .map_err(|e| not_found(e, id))?;
        Ok(())
    }

    /// Raw `/welcome` banner.
    pub async fn welcome(&self) -> Result<String, ClientError> {
        let resp = self.send(self.client.get(self.url("/welcome"))).await?;
        Ok(resp.text().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let request = match &self.group {
            Some(group) => request.header(self.group_header.as_str(), group.as_str()),
            None => request,
        };

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }
        Ok(resp)
    }
}

fn not_found(err: ClientError, id: &str) -> ClientError {
    match err {
        ClientError::Status { status, .. } if status == StatusCode::NOT_FOUND => {
            ClientError::NotFound(id.to_string())
        }
        other => other,
    }
}
