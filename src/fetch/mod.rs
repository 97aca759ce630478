mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};
use serde_json::{Map, Value};

/// Executes a GET and decodes the body as an array of JSON objects, the
/// shape every Socrata resource endpoint returns. Non-2xx responses become
/// errors carrying the status and body text.
pub async fn fetch_objects<C>(client: &C, url: reqwest::Url) -> Result<Vec<Map<String, Value>>>
where
    C: HttpClient + ?Sized,
{
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("request failed with status {status}: {body}");
    }

    Ok(resp.json().await?)
}
