//! Request Executor
//!
//! Turns a [`Link`] plus parameters into a transport request, sends it and
//! classifies the outcome. Stateless across invocations.

use super::transport::{sanitize_for_log, Transport, TransportRequest, TransportResponse};
use crate::error::{ClientError, Result};
use crate::resource::decoder::{Envelope, ResponseDecoder};
use crate::resource::link::{Link, Parameters};
use std::sync::Arc;
use url::Url;

/// Server exit codes meaning the addressed entity does not exist
const NOT_FOUND_EXIT_CODES: &[i64] = &[101, 118, 127];

/// Server exit codes meaning the entity to create is already taken
const ALREADY_EXISTS_EXIT_CODES: &[i64] = &[103, 120, 121];

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Executes links against the control plane
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    decoder: ResponseDecoder,
    base_url: Url,
}

impl RequestExecutor {
    /// Create an executor resolving relative hrefs against `base_url`
    pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            decoder: ResponseDecoder::json(),
            base_url,
        }
    }

    pub fn with_decoder(mut self, decoder: ResponseDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn decoder(&self) -> &ResponseDecoder {
        &self.decoder
    }

    /// Resolve an href; absolute hrefs are used as is
    fn resolve_href(&self, href: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(href) {
            return Ok(url);
        }

        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            href.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ClientError::InvalidUrl {
            url: joined.clone(),
            reason: e.to_string(),
        })
    }

    /// Validate parameters and describe the transport request for `link`
    pub fn build_request(&self, link: &Link, params: &Parameters) -> Result<TransportRequest> {
        link.validate(params)?;

        let path_names = link.path_parameters();
        let mut href = link.href().to_string();
        for name in &path_names {
            let Some(value) = params.get(name) else {
                return Err(ClientError::ParameterMismatch {
                    link: link.name().to_string(),
                    missing: vec![name.to_string()],
                    unexpected: Vec::new(),
                    mistyped: Vec::new(),
                });
            };
            let encoded = urlencoding::encode(&value.to_string()).into_owned();
            href = href.replace(&format!("{{{}}}", name), &encoded);
        }

        let mut url = self.resolve_href(&href)?;
        let remaining: Vec<(String, String)> = params
            .iter()
            .filter(|(name, _)| !path_names.contains(name))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let mut headers = vec![(
            "Accept".to_string(),
            self.decoder.media_type().to_string(),
        )];
        let mut body = None;

        if link.method().encodes_in_query() {
            if !remaining.is_empty() {
                let encoded = encode_pairs(&remaining);
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{}&{}", existing, encoded),
                    _ => encoded,
                };
                url.set_query(Some(&query));
            }
        } else {
            headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
            body = Some(encode_pairs(&remaining).into_bytes());
        }

        Ok(TransportRequest {
            method: link.method(),
            url,
            headers,
            body,
        })
    }

    /// Execute `link` with `params` and return the decoded envelope.
    ///
    /// No network call is made when the parameters do not match the link.
    pub async fn execute(&self, link: &Link, params: &Parameters) -> Result<Envelope> {
        let request = self.build_request(link, params)?;
        tracing::debug!("{} {} ({})", request.method, request.url, link.name());

        let response = self.transport.send(request).await?;
        if response.is_success() {
            return self.decoder.envelope(&response.payload);
        }

        Err(self.classify_failure(link, &response))
    }

    fn classify_failure(&self, link: &Link, response: &TransportResponse) -> ClientError {
        let body = String::from_utf8_lossy(&response.payload);
        // bodies may echo credentials; only a truncated copy is logged
        tracing::error!(
            "API error on {}: {} - {}",
            link.name(),
            response.status,
            sanitize_for_log(&body)
        );

        let envelope = self.decoder.envelope(&response.payload).ok();
        let exit_code = envelope.as_ref().and_then(|e| e.exit_code());
        let message = envelope
            .as_ref()
            .map(|e| e.message_text())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| format!("{} returned HTTP {}", link.name(), response.status));

        classify(response.status, exit_code, message)
    }
}

/// Map a failed status and server exit code to an error kind
fn classify(status: u16, exit_code: Option<i64>, message: String) -> ClientError {
    let code_in = |codes: &[i64]| exit_code.map(|c| codes.contains(&c)).unwrap_or(false);

    if status == 401 {
        ClientError::InvalidCredentials { message }
    } else if status == 404 || code_in(NOT_FOUND_EXIT_CODES) {
        ClientError::NotFound { message, exit_code }
    } else if status == 409 || code_in(ALREADY_EXISTS_EXIT_CODES) {
        ClientError::AlreadyExists { message, exit_code }
    } else if (500..600).contains(&status) {
        ClientError::ServerError { status, message }
    } else {
        ClientError::RequestFailed {
            status,
            message,
            exit_code,
        }
    }
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                urlencoding::encode(name),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
