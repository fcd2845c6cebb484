//! Request handlers.
//!
//! Every handler follows the same shape: build [`ViewData`] (which consumes
//! the pending flash), do the work, then render a page or redirect. Form
//! posts distinguish two failure channels: a payload that cannot be decoded
//! is a 400, while a decoded form that fails validation is re-rendered with
//! its errors and a 422.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use bytes::Bytes;
use http::StatusCode;
use snippetbox_forms::{decode, FormData, Validated};

use crate::error::StoreError;
use crate::forms::{SnippetCreateForm, UserSignupForm};
use crate::helpers::{client_error, not_found, render, server_error};
use crate::server::AppState;
use crate::session::SessionKey;
use crate::view_data::{ViewData, FLASH_KEY};

/// Flash shown after a snippet is created.
pub const SNIPPET_CREATED_FLASH: &str = "Snippet successfully created!";
/// Flash shown after a successful signup.
pub const SIGNUP_FLASH: &str = "Your signup was successful.";
/// Field error for an email that is already registered.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email address is already in use";

/// `GET /`: the latest snippets.
pub async fn home(
    State(app): State<AppState>,
    Extension(SessionKey(session)): Extension<SessionKey>,
) -> Response {
    let snippets = match app.snippets.latest().await {
        Ok(snippets) => snippets,
        Err(err) => return server_error(&err),
    };
    let data = ViewData::new(app.sessions.store(), &session)
        .await
        .with_snippets(snippets);
    render(&app.templates, "home.html", StatusCode::OK, &data)
}

/// `GET /snippet/view/{id}`: one snippet, or 404.
pub async fn snippet_view(
    State(app): State<AppState>,
    Extension(SessionKey(session)): Extension<SessionKey>,
    Path(id): Path<String>,
) -> Response {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return not_found(),
    };
    let snippet = match app.snippets.get(id).await {
        Ok(snippet) => snippet,
        Err(StoreError::NoRecord) => return not_found(),
        Err(err) => return server_error(&err),
    };
    let data = ViewData::new(app.sessions.store(), &session)
        .await
        .with_snippet(snippet);
    render(&app.templates, "view.html", StatusCode::OK, &data)
}

/// `GET /snippet/create`: the empty create form.
pub async fn snippet_create(
    State(app): State<AppState>,
    Extension(SessionKey(session)): Extension<SessionKey>,
) -> Response {
    let data = ViewData::new(app.sessions.store(), &session)
        .await
        .with_form(&SnippetCreateForm::default());
    render(&app.templates, "create.html", StatusCode::OK, &data)
}

/// `POST /snippet/create`: validates and stores a snippet.
pub async fn snippet_create_post(
    State(app): State<AppState>,
    Extension(SessionKey(session)): Extension<SessionKey>,
    body: Bytes,
) -> Response {
    let mut form = SnippetCreateForm::default();
    if let Err(err) = decode(&FormData::from_bytes(&body), &mut form) {
        tracing::debug!(error = %err, "rejecting undecodable snippet form");
        return client_error(StatusCode::BAD_REQUEST);
    }

    form.validate();
    if !form.is_valid() {
        let data = ViewData::new(app.sessions.store(), &session)
            .await
            .with_form(&form);
        return render(
            &app.templates,
            "create.html",
            StatusCode::UNPROCESSABLE_ENTITY,
            &data,
        );
    }

    let id = match app
        .snippets
        .insert(&form.title, &form.content, form.expired)
        .await
    {
        Ok(id) => id,
        Err(err) => return server_error(&err),
    };
    tracing::info!(id, "snippet created");

    if let Err(err) = app
        .sessions
        .store()
        .put_string(&session, FLASH_KEY, SNIPPET_CREATED_FLASH)
        .await
    {
        return server_error(&err);
    }
    Redirect::to(&format!("/snippet/view/{id}")).into_response()
}

/// `GET /user/signup`: the empty signup form.
pub async fn user_signup(
    State(app): State<AppState>,
    Extension(SessionKey(session)): Extension<SessionKey>,
) -> Response {
    let data = ViewData::new(app.sessions.store(), &session)
        .await
        .with_form(&UserSignupForm::default());
    render(&app.templates, "signup.html", StatusCode::OK, &data)
}

/// `POST /user/signup`: validates and registers a user.
pub async fn user_signup_post(
    State(app): State<AppState>,
    Extension(SessionKey(session)): Extension<SessionKey>,
    body: Bytes,
) -> Response {
    let mut form = UserSignupForm::default();
    if let Err(err) = decode(&FormData::from_bytes(&body), &mut form) {
        tracing::debug!(error = %err, "rejecting undecodable signup form");
        return client_error(StatusCode::BAD_REQUEST);
    }

    form.validate();
    if form.is_valid() {
        match app.users.insert(&form.name, &form.email, &form.password).await {
            Ok(id) => {
                tracing::info!(id, "user signed up");
                if let Err(err) = app
                    .sessions
                    .store()
                    .put_string(&session, FLASH_KEY, SIGNUP_FLASH)
                    .await
                {
                    return server_error(&err);
                }
                return Redirect::to("/").into_response();
            }
            Err(StoreError::DuplicateEmail) => {
                form.add_field_error("email", DUPLICATE_EMAIL_MESSAGE);
            }
            Err(err) => return server_error(&err),
        }
    }

    let data = ViewData::new(app.sessions.store(), &session)
        .await
        .with_form(&form);
    render(
        &app.templates,
        "signup.html",
        StatusCode::UNPROCESSABLE_ENTITY,
        &data,
    )
}

/// Fallback for unmatched routes.
pub async fn fallback() -> Response {
    not_found()
}
