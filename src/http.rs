//! HTTP client utilities.
//!
//! Construction of the underlying `reqwest::Client` and header helpers
//! shared by every request the [`ApiClient`](crate::client::ApiClient) makes.

use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;

use crate::options::ClientOptions;

/// Build a configured HTTP client from client options.
///
/// This applies common configuration like timeouts and proxies.
pub fn build_http_client(options: &ClientOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &options.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// Add extra headers to a request if any are configured.
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_http_client() {
        let options = ClientOptions::new("test").with_timeout(Duration::from_secs(30));

        let client = build_http_client(&options);
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_http_client_with_proxy() {
        let options =
            ClientOptions::new("test").with_proxy("http://proxy.example.com:8080".to_string());

        let client = build_http_client(&options);
        assert!(client.is_ok());
    }

    #[test]
    fn test_extra_headers_are_applied() {
        let client = Client::new();
        let mut headers = HashMap::new();
        headers.insert("X-Trace".to_string(), "abc".to_string());

        let request = add_extra_headers(client.get("http://localhost/"), &Some(headers))
            .build()
            .unwrap();
        assert_eq!(request.headers()["X-Trace"], "abc");
    }
}
