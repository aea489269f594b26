use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::data_models::encode_component;
use crate::error::{ClientError, Result};

pub const SUGGESTIONS_PATH: &str = "/search_suggestions";
pub const WISHLIST_PATH: &str = "/add_to_wishlist";
pub const REQUESTED_WITH: &str = "X-Requested-With";
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// The server side both components talk to.
pub trait Backend: Send + Sync + 'static {
    /// Fetches suggestions for `query`. A non-2xx answer yields an empty list.
    /// Resolves to `ClientError::Cancelled` as soon as `cancel` fires.
    fn fetch_suggestions(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Posts a make/model pair and returns the raw response body, whatever
    /// the status code. Only transport failures are errors.
    fn toggle_wishlist(&self, make: &str, model: &str)
    -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: Url, session_cookie: Option<&str>) -> Result<HttpBackend> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ClientError::InvalidHeader(format!("session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(HttpBackend { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<HttpBackend> {
        Self::new(config.base_url.clone(), config.session_cookie.as_deref())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    /// `/search_suggestions?query=...`, encoded like `encodeURIComponent`.
    pub fn suggestions_url(&self, query: &str) -> Result<Url> {
        let mut url = self.endpoint(SUGGESTIONS_PATH)?;
        url.set_query(Some(&format!("query={}", encode_component(query))));
        Ok(url)
    }

    async fn get_suggestions(&self, query: &str) -> Result<Vec<String>> {
        let url = self.suggestions_url(query)?;
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            log::warn!(
                "suggestions for {query:?} answered {}, treating as empty",
                res.status()
            );
            return Ok(Vec::new());
        }
        let body = res.bytes().await?;
        let items: Vec<String> = serde_json::from_slice(&body)?;
        Ok(items)
    }
}

impl Backend for HttpBackend {
    async fn fetch_suggestions(&self, query: &str, cancel: CancellationToken) -> Result<Vec<String>> {
        // Dropping the request future aborts the underlying connection.
        tokio::select! {
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            res = self.get_suggestions(query) => res,
        }
    }

    async fn toggle_wishlist(&self, make: &str, model: &str) -> Result<String> {
        let url = self.endpoint(WISHLIST_PATH)?;
        let res = self
            .client
            .post(url)
            .header(REQUESTED_WITH, XML_HTTP_REQUEST)
            .form(&[("bike_make", make), ("bike_model", model)])
            .send()
            .await?;
        log::debug!("wishlist toggle for {make} {model} answered {}", res.status());
        let body = res.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestions_url_uses_uri_component_encoding() {
        let backend = HttpBackend::new(Url::parse("http://127.0.0.1:5000").unwrap(), None).unwrap();
        let url = backend.suggestions_url("Trek Domane+ & co").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/search_suggestions?query=Trek%20Domane%2B%20%26%20co"
        );
    }
}
