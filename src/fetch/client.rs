use async_trait::async_trait;
use reqwest::{Request, Response};

/// Boundary for HTTP execution. Production uses [`super::BasicClient`],
/// optionally wrapped by [`super::auth::AppToken`]; tests substitute
/// canned-response stubs.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
