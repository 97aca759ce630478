use super::client::HttpClient;
use async_trait::async_trait;

/// Plain passthrough client.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl From<reqwest::Client> for BasicClient {
    /// Wraps a pre-configured client, keeping its timeouts and TLS setup.
    fn from(client: reqwest::Client) -> Self {
        Self(client)
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
