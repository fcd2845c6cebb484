//! End-to-end tests of the router against the templates under `ui/html`.
//!
//! Tests cover:
//! 1. Home page with and without snippets
//! 2. Snippet view, including 404s for bad ids
//! 3. The create flow: 400 on undecodable input, 422 on invalid input,
//!    303 + one-shot flash on success
//! 4. The signup flow, including duplicate emails
//! 5. Session cookies and static files

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use http::{HeaderMap, Method, Request, StatusCode};
use snippetbox_template::TemplateCache;
use snippetbox_views::models::{InMemorySnippetStore, InMemoryUserStore, SnippetStore};
use snippetbox_views::{router, AppState, InMemorySessionStore, SessionManager};
use tower::ServiceExt;

fn ui_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../ui")
}

struct TestApp {
    router: Router,
    snippets: Arc<InMemorySnippetStore>,
}

fn app() -> TestApp {
    let templates = TemplateCache::from_dir(ui_dir().join("html")).unwrap();
    let snippets = Arc::new(InMemorySnippetStore::new());
    let state = AppState {
        templates: Arc::new(templates),
        snippets: snippets.clone(),
        users: Arc::new(InMemoryUserStore::with_cost(4)),
        sessions: SessionManager::new(Arc::new(InMemorySessionStore::default()), "session", 3600),
    };
    TestApp {
        router: router(state, ui_dir().join("static")),
        snippets,
    }
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> TestResponse {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

async fn get(app: &TestApp, path: &str, cookie: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn post(app: &TestApp, path: &str, body: &str) -> TestResponse {
    let req = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

// ============================================================================
// 1. Home
// ============================================================================

#[tokio::test]
async fn test_home_empty() {
    let app = app();
    let res = get(&app, "/", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.headers.get(CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    assert!(res.body.contains("<title>Home - Snippetbox</title>"));
    assert!(res.body.contains("There's nothing to see here... yet!"));
    assert!(res.body.contains(r#"<a href="/snippet/create">Create snippet</a>"#));
    assert!(res.session_cookie().is_none());
}

#[tokio::test]
async fn test_home_lists_snippets_escaped() {
    let app = app();
    app.snippets
        .insert("<b>An old silent pond</b>", "A frog jumps in", 7)
        .await
        .unwrap();
    let res = get(&app, "/", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains(r#"<a href="/snippet/view/1">"#));
    assert!(res.body.contains("&lt;b&gt;An old silent pond&lt;/b&gt;"));
    assert!(!res.body.contains("nothing to see here"));
}

// ============================================================================
// 2. View
// ============================================================================

#[tokio::test]
async fn test_view_snippet() {
    let app = app();
    let id = app.snippets.insert("Title", "Body text", 365).await.unwrap();
    let res = get(&app, &format!("/snippet/view/{id}"), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("<title>Snippet #1 - Snippetbox</title>"));
    assert!(res.body.contains("<pre><code>Body text</code></pre>"));
    assert!(res.body.contains("Created: "));
}

#[tokio::test]
async fn test_view_bad_ids_are_not_found() {
    let app = app();
    for path in ["/snippet/view/abc", "/snippet/view/0", "/snippet/view/-3", "/snippet/view/42"] {
        let res = get(&app, path, None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(res.body, "Not Found");
    }
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = app();
    let res = get(&app, "/no/such/page", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// 3. Create flow
// ============================================================================

#[tokio::test]
async fn test_create_form_defaults() {
    let app = app();
    let res = get(&app, "/snippet/create", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains(r#"value="1" checked"#));
    assert!(!res.body.contains(r#"value="7" checked"#));
    assert!(!res.body.contains(r#"class="error""#));
}

#[tokio::test]
async fn test_create_undecodable_is_bad_request() {
    let app = app();
    let res = post(&app, "/snippet/create", "title=Hi&content=x&expired=soon").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, "Bad Request");
    assert!(app.snippets.latest().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_invalid_rerenders_with_errors() {
    let app = app();
    let res = post(&app, "/snippet/create", "title=&content=Keep+me&expired=3").await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res
        .body
        .contains(r#"<label class="error">This field cannot be blank</label>"#));
    assert!(res.body.contains("This field must equal 1, 7 or 365"));
    assert!(res.body.contains("<textarea name=\"content\">Keep me</textarea>"));
    assert!(app.snippets.latest().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_success_redirects_with_one_shot_flash() {
    let app = app();
    let res = post(&app, "/snippet/create", "title=Hello&content=World&expired=7").await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.headers.get(LOCATION).unwrap(), "/snippet/view/1");

    let set_cookie = res.headers.get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    let cookie = res.session_cookie().unwrap();

    let first = get(&app, "/snippet/view/1", Some(&cookie)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert!(first
        .body
        .contains(r#"<div class="flash">Snippet successfully created!</div>"#));
    assert!(first.body.contains("<strong>Hello</strong>"));

    let second = get(&app, "/snippet/view/1", Some(&cookie)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert!(!second.body.contains("Snippet successfully created!"));
}

#[tokio::test]
async fn test_flash_not_visible_to_other_sessions() {
    let app = app();
    let res = post(&app, "/snippet/create", "title=Hello&content=World&expired=1").await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);

    let other = get(&app, "/", None).await;
    assert!(!other.body.contains("Snippet successfully created!"));
}

// ============================================================================
// 4. Signup flow
// ============================================================================

#[tokio::test]
async fn test_signup_page() {
    let app = app();
    let res = get(&app, "/user/signup", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("<title>Signup - Snippetbox</title>"));
}

#[tokio::test]
async fn test_signup_invalid() {
    let app = app();
    let res = post(&app, "/user/signup", "name=&email=nope&password=short").await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body.contains("This field must be a valid email address"));
    assert!(res.body.contains("This field must be at least 8 characters long"));
    assert!(res.body.contains(r#"value="nope""#));
    assert!(!res.body.contains("short"));
}

#[tokio::test]
async fn test_signup_success_then_duplicate() {
    let app = app();
    let body = "name=Alice&email=alice%40example.com&password=pa55word!";

    let res = post(&app, "/user/signup", body).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.headers.get(LOCATION).unwrap(), "/");
    let cookie = res.session_cookie().unwrap();

    let home = get(&app, "/", Some(&cookie)).await;
    assert!(home.body.contains("Your signup was successful."));

    let dup = post(&app, "/user/signup", body).await;
    assert_eq!(dup.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(dup.body.contains("Email address is already in use"));
}

// ============================================================================
// 5. Cookies and static files
// ============================================================================

#[tokio::test]
async fn test_unknown_session_cookie_is_replaced() {
    let app = app();
    let res = get(&app, "/", Some("session=forged")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.session_cookie().is_none());
}

#[tokio::test]
async fn test_static_files_served() {
    let app = app();
    let res = get(&app, "/static/css/main.css", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains(".flash"));
}
