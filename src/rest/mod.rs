//! This module provides the transport used by every API call: building
//! authenticated requests against the configured base URL, sending them, and
//! mapping the answer into either the expected type or an [`Error`].
//!
//! Every non-2xx answer becomes an [`Error::Request`] carrying the status and
//! the error payload; every failure to get an answer at all becomes an
//! [`Error::Technical`]. Nothing is retried.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    client::Client,
    error::{Error, ParseError, RequestError},
};

#[macro_use]
pub(crate) mod macros;
pub(crate) mod server;

impl Client {
    #[inline]
    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http().get(self.url(path))
    }

    #[inline]
    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http().post(self.url(path))
    }

    #[inline]
    pub(crate) fn patch(&self, path: &str) -> RequestBuilder {
        self.http().patch(self.url(path))
    }

    #[inline]
    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.http().delete(self.url(path))
    }

    /// Sends `request` and deserializes a successful body into `T`.
    ///
    /// An empty successful body is read as JSON `null`.
    pub(crate) async fn execute<T>(&self, request: RequestBuilder) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request).await?;
        Self::handle_response(response).await
    }

    /// Sends `request` and discards a successful body.
    pub(crate) async fn execute_empty(&self, request: RequestBuilder) -> Result<(), Error> {
        let response = self.send(request).await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            Ok(())
        } else {
            Err(Self::handle_not_ok(status, &body))
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let request = request.build()?;
        let (method, url) = (request.method().clone(), request.url().clone());

        tracing::debug!(%method, %url, "sending request");
        let response = self.http().execute(request).await.map_err(|err| {
            tracing::debug!(%method, %url, error = %err, "request failed");
            Error::from(err)
        })?;
        tracing::debug!(%method, %url, status = %response.status(), "received response");

        Ok(response)
    }

    pub(crate) async fn handle_response<T>(response: Response) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(Self::handle_not_ok(status, &body));
        }

        let raw: &[u8] = if body.is_empty() { b"null" } else { &body };
        serde_json::from_slice(raw).map_err(|source| {
            ParseError {
                source,
                body: String::from_utf8_lossy(&body).into_owned(),
            }
            .into()
        })
    }

    #[inline(always)]
    fn handle_not_ok(status: StatusCode, body: &[u8]) -> Error {
        let body = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
        };

        tracing::warn!(%status, %body, "unsuccessful request");
        RequestError::new(status, body).into()
    }
}
