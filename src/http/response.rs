//! Response values returned to the client.
//!
//! # Responsibilities
//! - Carry upstream status, headers and body
//! - Keep a read-only reference to the request that produced it
//! - Convert into an axum response
//!
//! # Design Decisions
//! - Mutable until returned, so post-forward interceptors can rewrite it
//! - Bodies are fully buffered (`Bytes`)

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::RequestSnapshot;

#[derive(Debug, Clone)]
pub struct ResponseData {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    request: RequestSnapshot,
}

impl ResponseData {
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        request: RequestSnapshot,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            request,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    /// The request this response answers.
    pub fn request(&self) -> &RequestSnapshot {
        &self.request
    }
}

impl IntoResponse for ResponseData {
    fn into_response(mut self) -> Response {
        // An interceptor may have replaced the body; keep the declared length honest.
        if *self.request.method() != Method::HEAD
            && self.headers.contains_key(header::CONTENT_LENGTH)
        {
            self.headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        }

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
