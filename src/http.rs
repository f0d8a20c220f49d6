use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::assistant::AssistantService;
use crate::session::SessionStore;

const SESSION_COOKIE: &str = "sid";

/// Shared state handed to every request handler
pub struct AppState {
    pub assistant: Arc<AssistantService>,
    pub sessions: SessionStore,
}

pub fn router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/create_thread", post(create_thread))
        .route("/message", post(message))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

fn session_id_from(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn error_response(status: StatusCode, message: String) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"error": message})))
}

/// POST /create_thread: ask the driver for a fresh remote thread and bind it
/// to the caller's session, establishing the session cookie if needed.
async fn create_thread(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (session_id, fresh_session) = match session_id_from(&headers) {
        Some(id) => (id, false),
        None => (SessionStore::new_session_id(), true),
    };

    match state.assistant.create_thread().await {
        Ok(thread_id) => {
            state
                .sessions
                .set_thread(&session_id, thread_id.clone())
                .await;

            let mut response = Json(json!({"thread_id": thread_id})).into_response();
            if fresh_session {
                let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
                if let Ok(value) = HeaderValue::from_str(&cookie) {
                    response.headers_mut().insert(header::SET_COOKIE, value);
                }
            }
            response
        }
        Err(e) => {
            tracing::error!("Failed to create thread: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    message: String,
}

/// POST /message: requires a thread bound to the caller's session; the
/// driver is never invoked without one.
async fn message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<MessagePayload>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let thread_id = match session_id_from(&headers) {
        Some(session_id) => state.sessions.thread_for(&session_id).await,
        None => None,
    };
    let Some(thread_id) = thread_id else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No thread ID found. Please create a new thread.".to_string(),
        ));
    };

    match state
        .assistant
        .process_message(&thread_id, &payload.message)
        .await
    {
        Ok(reply) => Ok(Json(json!({"response": reply}))),
        Err(e) => {
            tracing::error!("Failed to process message in thread {thread_id}: {e}");
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
