//! HTTP response assertions.
//!
//! [`WebClient`] performs the request and captures the full response;
//! the free functions check it through an [`Assert`] handle.
//!
//! ```no_run
//! # async fn demo() -> mtls_kit::Result<()> {
//! use mtls_kit::assert::{Assert, PanicReporter};
//! use mtls_kit::web::{self, WebClient};
//!
//! let a = Assert::new(PanicReporter);
//! WebClient::new()?
//!     .request_and_test("http://127.0.0.1:8080/health", |resp| {
//!         web::status_code(&a, 200, resp);
//!         web::body(&a, "ok", resp);
//!     })
//!     .await
//! # }
//! ```

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use tracing::debug;

use crate::assert::{Assert, Reporter};
use crate::{Error, Result};

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct Captured {
    /// Status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Body, decoded as UTF-8
    pub body: String,
}

/// HTTP client used by the test helpers.
#[derive(Debug, Clone)]
pub struct WebClient {
    client: Client,
}

impl WebClient {
    /// Plain client with the default roots.
    pub fn new() -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client })
    }

    /// Client using a prepared rustls config, e.g. from
    /// [`ResolvedTls::client_config`](crate::mtls::ResolvedTls::client_config).
    pub fn with_tls(tls: rustls::ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .use_preconfigured_tls(tls)
            .build()?;
        Ok(Self { client })
    }

    /// `GET url`
    pub async fn get(&self, url: &str) -> Result<Captured> {
        self.send(Method::GET, url, Vec::new(), HeaderMap::new())
            .await
    }

    /// `DELETE url`
    pub async fn delete(&self, url: &str) -> Result<Captured> {
        self.send(Method::DELETE, url, Vec::new(), HeaderMap::new())
            .await
    }

    /// `POST url` with `content`.
    ///
    /// Without `headers` the request is sent as `application/json`;
    /// otherwise exactly the given headers are set.
    pub async fn post(
        &self,
        url: &str,
        content: impl Into<Vec<u8>>,
        headers: &[(&str, &str)],
    ) -> Result<Captured> {
        let mut map = HeaderMap::new();
        if headers.is_empty() {
            map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (k, v) in headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|e| Error::Config(format!("invalid header name {k:?}: {e}")))?;
            let value = HeaderValue::from_str(v)
                .map_err(|e| Error::Config(format!("invalid value for header {k:?}: {e}")))?;
            map.insert(name, value);
        }

        self.send(Method::POST, url, content.into(), map).await
    }

    /// GET, then hand the response to `handler`.
    pub async fn request_and_test<F>(&self, url: &str, handler: F) -> Result<()>
    where
        F: FnOnce(&Captured),
    {
        handler(&self.get(url).await?);
        Ok(())
    }

    /// POST, then hand the response to `handler`.
    pub async fn push_and_test<F>(
        &self,
        url: &str,
        content: impl Into<Vec<u8>>,
        headers: &[(&str, &str)],
        handler: F,
    ) -> Result<()>
    where
        F: FnOnce(&Captured),
    {
        handler(&self.post(url, content, headers).await?);
        Ok(())
    }

    /// DELETE, then hand the response to `handler`.
    pub async fn delete_and_test<F>(&self, url: &str, handler: F) -> Result<()>
    where
        F: FnOnce(&Captured),
    {
        handler(&self.delete(url).await?);
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Vec<u8>,
        headers: HeaderMap,
    ) -> Result<Captured> {
        debug!(%method, url, "sending request");

        let mut req = self.client.request(method, url).headers(headers);
        if !body.is_empty() {
            req = req.body(body);
        }

        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.text().await?;

        debug!(status, len = body.len(), "response received");
        Ok(Captured {
            status,
            headers,
            body,
        })
    }
}

/// Body equals `want`.
pub fn body<R: Reporter>(a: &Assert<R>, want: &str, resp: &Captured) -> bool {
    a.equal(resp.body.as_str(), want)
}

/// Body contains `want`.
pub fn body_contains<R: Reporter>(a: &Assert<R>, want: &str, resp: &Captured) -> bool {
    a.contains(&resp.body, want)
}

/// Body differs from `want`.
pub fn body_differs<R: Reporter>(a: &Assert<R>, want: &str, resp: &Captured) -> bool {
    a.not_equal(resp.body.as_str(), want)
}

/// Status code equals `want`.
pub fn status_code<R: Reporter>(a: &Assert<R>, want: u16, resp: &Captured) -> bool {
    a.equal(&resp.status, &want)
}

/// First value of `key` equals `val`.
pub fn header<R: Reporter>(a: &Assert<R>, key: &str, val: &str, resp: &Captured) -> bool {
    let have = resp.headers.get(key).and_then(|v| v.to_str().ok());
    a.is_true_ctx(
        have == Some(val),
        &format!("assertion failed for the {key:?} header: {have:?} != {val:?}"),
    )
}

/// Every `(key, value)` pair matches; stops at the first mismatch.
pub fn headers<R: Reporter>(a: &Assert<R>, resp: &Captured, kv: &[(&str, &str)]) -> bool {
    kv.iter().all(|(k, v)| header(a, k, v, resp))
}

/// As [`headers`], and the response carries no other header names.
pub fn headers_exact<R: Reporter>(a: &Assert<R>, resp: &Captured, kv: &[(&str, &str)]) -> bool {
    if !headers(a, resp, kv) {
        return false;
    }

    a.equal_ctx(
        &resp.headers.keys_len(),
        &kv.len(),
        &format!(
            "headers differ (exp != current): {kv:?} != {:?}",
            resp.headers
        ),
    )
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{delete, get, post};

    use super::*;
    use crate::assert::Recorder;

    async fn serve() -> String {
        let app = Router::new()
            .route("/hello", get(|| async { "hello world" }))
            .route(
                "/echo",
                post(|headers: AxumHeaders, body: String| async move {
                    let ct = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("none")
                        .to_owned();
                    ([("x-content-type", ct)], body)
                }),
            )
            .route("/item", delete(|| async { StatusCode::NO_CONTENT }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn captured(status: u16, headers: &[(&'static str, &'static str)], body: &str) -> Captured {
        let mut map = HeaderMap::new();
        for &(k, v) in headers {
            map.insert(k, HeaderValue::from_static(v));
        }
        Captured {
            status,
            headers: map,
            body: body.to_owned(),
        }
    }

    #[test]
    fn body_checks() {
        let a = Assert::new(Recorder::default());
        let resp = captured(200, &[], "hello world");

        assert!(body(&a, "hello world", &resp));
        assert!(body_contains(&a, "lo wo", &resp));
        assert!(body_differs(&a, "bye", &resp));
        assert!(!body(&a, "hello", &resp));
        assert_eq!(a.reporter().failures().len(), 1);
    }

    #[test]
    fn header_checks() {
        let a = Assert::new(Recorder::default());
        let resp = captured(200, &[("x-a", "1"), ("x-b", "2")], "");

        assert!(header(&a, "x-a", "1", &resp));
        assert!(header(&a, "X-A", "1", &resp));
        assert!(headers(&a, &resp, &[("x-a", "1"), ("x-b", "2")]));
        assert!(headers_exact(&a, &resp, &[("x-a", "1"), ("x-b", "2")]));
        assert!(!a.reporter().failed());

        assert!(!header(&a, "x-missing", "1", &resp));
        assert!(!headers_exact(&a, &resp, &[("x-a", "1")]));
        assert_eq!(a.reporter().failures().len(), 2);
        assert!(a.reporter().failures()[0].contains("x-missing"));
    }

    #[tokio::test]
    async fn get_post_delete_against_live_server() {
        let base = serve().await;
        let client = WebClient::new().unwrap();
        let a = Assert::new(Recorder::default());

        client
            .request_and_test(&format!("{base}/hello"), |resp| {
                status_code(&a, 200, resp);
                body(&a, "hello world", resp);
            })
            .await
            .unwrap();

        client
            .push_and_test(&format!("{base}/echo"), r#"{"k":1}"#, &[], |resp| {
                body(&a, r#"{"k":1}"#, resp);
                header(&a, "x-content-type", "application/json", resp);
            })
            .await
            .unwrap();

        client
            .push_and_test(
                &format!("{base}/echo"),
                "plain",
                &[("content-type", "text/plain")],
                |resp| {
                    header(&a, "x-content-type", "text/plain", resp);
                },
            )
            .await
            .unwrap();

        client
            .delete_and_test(&format!("{base}/item"), |resp| {
                status_code(&a, 204, resp);
            })
            .await
            .unwrap();

        assert!(!a.reporter().failed(), "{:?}", a.reporter().failures());
    }

    #[tokio::test]
    async fn unreachable_server_is_an_http_error() {
        let client = WebClient::new().unwrap();
        let err = client.get("http://127.0.0.1:1/").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Http);
    }

    #[tokio::test]
    async fn invalid_header_name_is_rejected() {
        let client = WebClient::new().unwrap();
        let err = client
            .post("http://127.0.0.1:1/", "x", &[("bad header", "v")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }
}
