// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod codec;

pub use codec::{add_body, decode_records, delete_body, encode_id, fetch_body, update_body};

use anyhow::{Context, Result, anyhow, bail};
use procdesk_app::{
    Credential, EntitySchema, FetchMethod, Record, RecordId, RemoteSource, Session,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::COOKIE;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A [`RemoteSource`] speaking the back-office JSON API for one view.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: Url,
    schema: &'static EntitySchema,
    timeout: Duration,
    http: HttpClient,
}

impl HttpSource {
    pub fn new(base_url: &str, schema: &'static EntitySchema, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            schema,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("build endpoint URL for {path:?}"))
    }

    fn post(&self, session: &Session, path: &str, body: &Value) -> Result<Response> {
        let url = self.endpoint(path)?;
        debug!(view = self.schema.name, %url, "POST");
        self.send(session, self.http.post(url).json(body))
    }

    fn send(&self, session: &Session, request: RequestBuilder) -> Result<Response> {
        let response = authorize(request, session)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }
}

impl RemoteSource for HttpSource {
    fn fetch_all(&self, session: &Session) -> Result<Vec<Record>> {
        let endpoints = &self.schema.endpoints;
        let response = match endpoints.fetch_method {
            FetchMethod::Get => {
                let url = self.endpoint(endpoints.fetch_path)?;
                debug!(view = self.schema.name, %url, "GET");
                self.send(session, self.http.get(url))?
            }
            FetchMethod::Post => self.post(
                session,
                endpoints.fetch_path,
                &fetch_body(session.current_user()),
            )?,
        };

        let body: Value = response.json().context("decode fetch response")?;
        let records = decode_records(self.schema, body)
            .with_context(|| format!("decode {} rows", self.schema.name))?;
        debug!(view = self.schema.name, rows = records.len(), "fetched");
        Ok(records)
    }

    fn create(&self, session: &Session, record: &Record) -> Result<()> {
        let body = add_body(self.schema, record, session.current_user());
        self.post(session, self.schema.endpoints.add_path, &body)?;
        Ok(())
    }

    fn update(&self, session: &Session, record: &Record) -> Result<()> {
        let body = update_body(self.schema, record, session.current_user());
        self.post(session, self.schema.endpoints.update_path, &body)?;
        Ok(())
    }

    fn delete(&self, session: &Session, id: &RecordId) -> Result<()> {
        let body = delete_body(self.schema, id, session.current_user());
        self.post(session, self.schema.endpoints.delete_path, &body)?;
        Ok(())
    }
}

/// Absolute http(s) URL, normalized to end in `/` so endpoint paths join
/// beneath it.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("remote.base_url must not be empty");
    }
    let mut url = Url::parse(trimmed)
        .with_context(|| format!("remote.base_url {trimmed:?} is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "remote.base_url must use http or https, got {:?}",
            url.scheme()
        );
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn authorize(request: RequestBuilder, session: &Session) -> RequestBuilder {
    match session.credentials() {
        Some(Credential::Bearer(token)) => request.bearer_auth(token),
        Some(Credential::Cookie(cookie)) => request.header(COOKIE, cookie.as_str()),
        None => request,
    }
}

fn connection_error(base_url: &Url, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("request to {base_url} timed out ({error})");
    }
    anyhow!("cannot reach {base_url} -- is the API server running? ({error})")
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    let code = status.as_u16();
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.is_empty()
    {
        return anyhow!("HTTP {code}: {message}");
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') && !body.contains('<') {
        return anyhow!("HTTP {code}: {body}");
    }

    match status.canonical_reason() {
        Some(reason) => anyhow!("HTTP {code} {reason}"),
        None => anyhow!("HTTP {code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_error_response, parse_base_url};
    use reqwest::StatusCode;

    #[test]
    fn base_url_gains_trailing_slash() -> anyhow::Result<()> {
        let url = parse_base_url("http://localhost:8000/api")?;
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
        assert_eq!(
            url.join("suppliers/get-data")?.as_str(),
            "http://localhost:8000/api/suppliers/get-data"
        );
        Ok(())
    }

    #[test]
    fn base_url_rejects_non_http() {
        assert!(parse_base_url("").is_err());
        assert!(parse_base_url("localhost:8000").is_err());
        assert!(parse_base_url("ftp://example.com/api").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn error_bodies_are_summarized() {
        let message = clean_error_response(
            StatusCode::FORBIDDEN,
            r#"{"message":"session expired"}"#,
        );
        assert_eq!(message.to_string(), "HTTP 403: session expired");

        let short = clean_error_response(StatusCode::BAD_REQUEST, "missing email");
        assert_eq!(short.to_string(), "HTTP 400: missing email");

        let html = clean_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html><body>oops</body></html>",
        );
        assert_eq!(html.to_string(), "HTTP 500 Internal Server Error");
    }
}
