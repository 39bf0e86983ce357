use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use url::Url;

use super::{ BackendError, BackendReply, ChatBackend, ChatRequest };

#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    http: HttpClient,
    endpoint: Url,
}

impl HttpChatBackend {
    pub fn new(endpoint: &str) -> Result<Self, BackendError> {
        Ok(Self::with_client(HttpClient::new(), Url::parse(endpoint)?))
    }

    pub fn with_client(http: HttpClient, endpoint: Url) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn exchange(&self, request: &ChatRequest) -> Result<BackendReply, BackendError> {
        debug!(
            "POST {} (token={:?}, page_content={} chars)",
            self.endpoint,
            request.conversation_id,
            request.page_content.as_ref().map_or(0, |c| c.chars().count())
        );
        let resp = self.http.post(self.endpoint.clone()).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }
        Ok(resp.json::<BackendReply>().await?)
    }

    fn endpoint(&self) -> String {
        self.endpoint.to_string()
    }
}
