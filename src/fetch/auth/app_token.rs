use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::HeaderName;

/// An [`HttpClient`] wrapper that stamps a Socrata application token onto
/// every request as the `X-App-Token` header.
///
/// Anonymous requests share a global throttling pool; a registered token
/// gets its own, far higher, limit. A token that does not form a valid
/// header value is skipped, which degrades to anonymous access instead of
/// failing the request.
pub struct AppToken<C> {
    inner: C,
    token: String,
}

impl<C> AppToken<C> {
    pub fn new(inner: C, token: String) -> Self {
        Self { inner, token }
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for AppToken<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        if let Ok(value) = self.token.parse() {
            req.headers_mut()
                .insert(HeaderName::from_static("x-app-token"), value);
        }
        self.inner.execute(req).await
    }
}
