//! HTTP transport against the storefront server.
//!
//! Requests are sent the way the storefront's own scripts send them: form
//! encoded, tagged with `X-Requested-With: XMLHttpRequest`, redirects followed.

use super::{CartAction, CartTransport, FormSubmission, TransportError};
use crate::config::CartConfig;
use crate::model::OrderId;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const REQUESTED_WITH: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
    cart_count_path: Option<String>,
}

impl HttpTransport {
    /// Builds a transport from `base_url`, `request_timeout_ms` and `cart_count_path`.
    pub fn new(config: &CartConfig) -> Result<Self, TransportError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| TransportError::InvalidUrl("no base URL configured".to_string()))?;
        let base =
            Url::parse(base_url).map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;

        let mut builder = Client::builder();
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base,
            cart_count_path: config.cart_count_path.clone(),
        })
    }

    /// `{base}/update_cart/{order_id}`, with the id percent-encoded as one segment.
    pub fn update_url(&self, order_id: &OrderId) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(["update_cart", order_id.as_str()]);
        Ok(url)
    }

    /// Resolves a form action (absolute or relative) against the base.
    pub fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.base
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))
    }
}

#[async_trait]
impl CartTransport for HttpTransport {
    #[instrument(skip(self))]
    async fn update_cart(
        &self,
        order_id: &OrderId,
        action: CartAction,
    ) -> Result<(), TransportError> {
        let url = self.update_url(order_id)?;
        let response = self
            .client
            .post(url)
            .header(REQUESTED_WITH.0, REQUESTED_WITH.1)
            .form(&[("action", action.as_str())])
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!(status = %response.status(), "Update settled");
        Ok(())
    }

    #[instrument(skip(self, form), fields(action = %form.action))]
    async fn add_to_cart(&self, form: &FormSubmission) -> Result<(), TransportError> {
        let url = self.resolve(&form.action)?;
        let response = self
            .client
            .post(url)
            .header(REQUESTED_WITH.0, REQUESTED_WITH.1)
            .form(&form.fields)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!(status = %response.status(), "Add to cart settled");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn cart_count(&self) -> Result<u32, TransportError> {
        let path = self
            .cart_count_path
            .as_deref()
            .ok_or(TransportError::Unsupported("cart count endpoint not configured"))?;
        let url = self.resolve(path)?;
        let body = self
            .client
            .get(url)
            .header(REQUESTED_WITH.0, REQUESTED_WITH.1)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        body.trim()
            .parse()
            .map_err(|_| TransportError::InvalidResponse(format!("cart count {body:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        let config = CartConfig {
            base_url: Some(base.to_string()),
            cart_count_path: Some("/cart/count".to_string()),
            ..CartConfig::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_update_url_appends_segments() {
        let http = transport("http://shop.local");
        let url = http.update_url(&OrderId::from("42")).unwrap();
        assert_eq!(url.as_str(), "http://shop.local/update_cart/42");

        let prefixed = transport("http://shop.local/store/");
        let url = prefixed.update_url(&OrderId::from("a b")).unwrap();
        assert_eq!(url.as_str(), "http://shop.local/store/update_cart/a%20b");
    }

    #[test]
    fn test_resolve_form_action() {
        let http = transport("http://shop.local/store/");
        assert_eq!(
            http.resolve("/add_to_cart/7").unwrap().as_str(),
            "http://shop.local/add_to_cart/7"
        );
        assert_eq!(
            http.resolve("https://other.local/add_to_cart/7").unwrap().as_str(),
            "https://other.local/add_to_cart/7"
        );
    }

    #[test]
    fn test_missing_or_bad_base_url() {
        assert!(matches!(
            HttpTransport::new(&CartConfig::default()),
            Err(TransportError::InvalidUrl(_))
        ));
        let config = CartConfig {
            base_url: Some("not a url".to_string()),
            ..CartConfig::default()
        };
        assert!(matches!(
            HttpTransport::new(&config),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_cart_count_requires_endpoint() {
        let config = CartConfig {
            base_url: Some("http://shop.local".to_string()),
            ..CartConfig::default()
        };
        let http = HttpTransport::new(&config).unwrap();
        assert_eq!(
            http.cart_count().await,
            Err(TransportError::Unsupported("cart count endpoint not configured"))
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Reserve a free port, then release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let http = transport(&format!("http://{address}"));
        let result = http.update_cart(&OrderId::from("1"), CartAction::Increase).await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
