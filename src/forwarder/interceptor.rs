//! Post-forward response interceptors.
//!
//! Run after the forward-complete hook and before response header
//! sanitization, so anything they add is still subject to the strip.

use crate::http::ResponseData;
use crate::routing::Mapping;

/// May rewrite a response before it is returned to the client.
pub trait PostForwardInterceptor: Send + Sync {
    fn intercept(&self, response: &mut ResponseData, mapping: &Mapping);
}

/// Leaves responses untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInterceptor;

impl PostForwardInterceptor for NoopInterceptor {
    fn intercept(&self, _response: &mut ResponseData, _mapping: &Mapping) {}
}

/// Sets the mapping's configured response headers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseHeaderInterceptor;

impl PostForwardInterceptor for ResponseHeaderInterceptor {
    fn intercept(&self, response: &mut ResponseData, mapping: &Mapping) {
        for (name, value) in &mapping.interceptors().response_headers {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestData;
    use crate::load_balancer::Destination;
    use crate::routing::InterceptorSettings;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

    #[test]
    fn test_response_headers_applied() {
        let mapping = Mapping::new("svc", vec![Destination::new("http://d1")])
            .unwrap()
            .with_interceptors(InterceptorSettings {
                response_headers: vec![(
                    HeaderName::from_static("x-served-by"),
                    HeaderValue::from_static("edge"),
                )],
            });

        let mut headers = HeaderMap::new();
        headers.insert("x-served-by", HeaderValue::from_static("backend"));
        let request = RequestData::new(Method::GET, "h", "/", HeaderMap::new(), Bytes::new());
        let snapshot = request.into_snapshot();
        let mut response = ResponseData::new(StatusCode::OK, headers, Bytes::new(), snapshot);

        ResponseHeaderInterceptor.intercept(&mut response, &mapping);

        assert_eq!(response.headers()["x-served-by"], "edge");
        assert_eq!(response.headers().get_all("x-served-by").iter().count(), 1);
    }
}
