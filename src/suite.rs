//! Declarative HTTP endpoint test cases.
//!
//! ```no_run
//! # async fn demo() -> mtls_kit::Result<()> {
//! use mtls_kit::assert::{Assert, PanicReporter};
//! use mtls_kit::suite::{self, Case};
//! use mtls_kit::web::WebClient;
//!
//! let client = WebClient::new()?;
//! let cases = [
//!     Case::get_200().path("/health").body("ok").what("health probe"),
//!     Case::default().post().path("/items").payload_str(r#"{"id":1}"#).code(201),
//! ];
//! for case in &cases {
//!     suite::run(&Assert::new(PanicReporter), &client, "http://127.0.0.1:8080", case).await?;
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::Method;

use crate::Result;
use crate::assert::{Assert, Reporter};
use crate::web::{self, Captured, WebClient};

/// One request plus the expectations on its response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Case {
    verb: Option<Method>,
    path: String,
    body: String,
    contains: String,
    what: String,
    payload: Vec<u8>,
    headers: Vec<(String, String)>,
    code: u16,
}

impl Case {
    /// `GET` expecting `200 OK`.
    pub fn get_200() -> Self {
        Self::default().get().code(200)
    }

    /// Send a `GET`.
    #[must_use]
    pub fn get(mut self) -> Self {
        self.verb = Some(Method::GET);
        self
    }

    /// Send a `POST` with the payload as JSON.
    #[must_use]
    pub fn post(mut self) -> Self {
        self.verb = Some(Method::POST);
        self
    }

    /// Send a `DELETE`.
    #[must_use]
    pub fn delete(mut self) -> Self {
        self.verb = Some(Method::DELETE);
        self
    }

    /// Request path, appended to the base URI.
    #[must_use]
    pub fn path(mut self, p: impl Into<String>) -> Self {
        self.path = p.into();
        self
    }

    /// Append to the current path.
    #[must_use]
    pub fn path_add(mut self, p: &str) -> Self {
        self.path.push_str(p);
        self
    }

    /// Request body (POST only).
    #[must_use]
    pub fn payload(mut self, b: impl Into<Vec<u8>>) -> Self {
        self.payload = b.into();
        self
    }

    /// [`Case::payload`] from a string.
    #[must_use]
    pub fn payload_str(self, b: &str) -> Self {
        self.payload(b.as_bytes())
    }

    /// Expected exact response body. Takes precedence over [`Case::contains`].
    #[must_use]
    pub fn body(mut self, b: impl Into<String>) -> Self {
        self.body = b.into();
        self
    }

    /// Expected response body substring.
    #[must_use]
    pub fn contains(mut self, c: impl Into<String>) -> Self {
        self.contains = c.into();
        self
    }

    /// Expected status code.
    #[must_use]
    pub fn code(mut self, v: u16) -> Self {
        self.code = v;
        self
    }

    /// Replace the expected response headers.
    #[must_use]
    pub fn headers(mut self, h: Vec<(String, String)>) -> Self {
        self.headers = h;
        self
    }

    /// Add one expected response header.
    #[must_use]
    pub fn header_add(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.headers.push((key.into(), val.into()));
        self
    }

    /// Description shown in the log.
    #[must_use]
    pub fn what(mut self, w: impl Into<String>) -> Self {
        self.what = w.into();
        self
    }

    /// HTTP method, if one was chosen.
    pub fn verb(&self) -> Option<&Method> {
        self.verb.as_ref()
    }

    /// Request path.
    pub fn get_path(&self) -> &str {
        &self.path
    }

    /// Request body.
    pub fn get_payload(&self) -> &[u8] {
        &self.payload
    }

    /// Description.
    pub fn get_what(&self) -> &str {
        &self.what
    }

    /// Expected status code.
    pub fn get_code(&self) -> u16 {
        self.code
    }
}

/// Run `case` against `base_uri` and check the response.
///
/// Returns whether every check passed. Transport failures are errors; a
/// case without a verb is reported as a failed assertion.
pub async fn run<R: Reporter>(
    a: &Assert<R>,
    client: &WebClient,
    base_uri: &str,
    case: &Case,
) -> Result<bool> {
    let url = format!("{base_uri}{}", case.path);
    a.log(&format!("\t\t [?] running {}", case.what));

    let Some(verb) = case.verb.as_ref() else {
        return Ok(a.fail("no verb specified for test"));
    };

    let resp = if *verb == Method::GET {
        a.log(&format!("\t\t\t~~ GET {url:?}"));
        client.get(&url).await?
    } else if *verb == Method::POST {
        a.log(&format!(
            "\t\t\t~~ POST {url:?} {:?}",
            String::from_utf8_lossy(&case.payload)
        ));
        client.post(&url, case.payload.clone(), &[]).await?
    } else {
        a.log(&format!("\t\t\t~~ DELETE {url:?}"));
        client.delete(&url).await?
    };

    Ok(check(a, case, &resp))
}

/// Check a captured response against `case`'s expectations: exact body if
/// set, otherwise body substring if set, then status code, then headers.
pub fn check<R: Reporter>(a: &Assert<R>, case: &Case, resp: &Captured) -> bool {
    a.log(&format!(
        "\t\t\t [!] recv [{}] - [{}]",
        resp.status, resp.body
    ));

    let body_ok = if !case.body.is_empty() {
        web::body(a, &case.body, resp)
    } else if !case.contains.is_empty() {
        web::body_contains(a, &case.contains, resp)
    } else {
        a.log("~~ no check run against request body ~~");
        true
    };

    let code_ok = web::status_code(a, case.code, resp);

    let headers_ok = if case.headers.is_empty() {
        true
    } else {
        let kv: Vec<(&str, &str)> = case
            .headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        web::headers(a, resp, &kv)
    };

    body_ok && code_ok && headers_ok
}
