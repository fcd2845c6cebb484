//! Response helpers shared by the handlers.

use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use snippetbox_template::{ResponseSink, TemplateCache};

use crate::view_data::ViewData;

/// A response being filled in by a template render.
///
/// Nothing is sent unless the render commits a status.
#[derive(Debug, Default)]
pub struct HtmlResponse {
    status: Option<StatusCode>,
    body: BytesMut,
}

impl HtmlResponse {
    /// Creates an empty, uncommitted response.
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

impl ResponseSink for HtmlResponse {
    fn commit_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write_body(&mut self, chunk: Bytes) {
        self.body.extend_from_slice(&chunk);
    }
}

impl IntoResponse for HtmlResponse {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::OK);
        let mut response = (status, self.body.freeze()).into_response();
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        response
    }
}

/// Logs the error and sends a generic 500 response. The error detail never
/// reaches the client.
pub fn server_error(err: &dyn std::error::Error) -> Response {
    tracing::error!(error = %err, "internal server error");
    client_error(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Sends `status` with its standard reason phrase as the body.
pub fn client_error(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

/// Sends a 404 response.
pub fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}

/// Renders `page` with `data`. A failed render becomes a 500 response.
pub fn render(templates: &TemplateCache, page: &str, status: StatusCode, data: &ViewData) -> Response {
    let mut response = HtmlResponse::new();
    match templates.render(page, data, status, &mut response) {
        Ok(()) => response.into_response(),
        Err(err) => server_error(&err),
    }
}

#[cfg(test)]
mod tests {
    use snippetbox_template::TemplateSource;

    use super::*;

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn view_data() -> ViewData {
        ViewData {
            form: serde_json::Value::Null,
            snippets: vec![],
            snippet: None,
            flash: String::new(),
            has_flash: false,
            current_year: 2026,
        }
    }

    #[tokio::test]
    async fn test_client_error_uses_reason_phrase() {
        let response = client_error(StatusCode::BAD_REQUEST);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await, "Bad Request");
    }

    #[tokio::test]
    async fn test_not_found() {
        let response = not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await, "Not Found");
    }

    #[tokio::test]
    async fn test_server_error_hides_detail() {
        let err = std::io::Error::other("database password is hunter2");
        let response = server_error(&err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_render_success_and_failure() {
        let cache = TemplateCache::build(
            TemplateSource::new("base.html", "{% block main %}{% endblock %}"),
            vec![],
            vec![TemplateSource::new(
                "home.html",
                "{% block main %}(c) {{ current_year }}{% endblock %}",
            )],
        )
        .unwrap();

        let ok = render(&cache, "home.html", StatusCode::OK, &view_data());
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(
            ok.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(body_of(ok).await, "(c) 2026");

        let missing = render(&cache, "nope.html", StatusCode::OK, &view_data());
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(missing).await, "Internal Server Error");
    }
}
