use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::AppState;

/// Header carrying the cursor for the next page. Absent on the last page.
const CURSOR_HEADER: HeaderName = HeaderName::from_static("x-cursor");

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub take: Option<i64>,
}

/// GET /{user} — one page of the user's feed, newest first. An unknown user
/// is indistinguishable from an empty feed.
pub async fn get_news(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Query(query): Query<NewsQuery>,
) -> Response {
    let take = query.take.unwrap_or(0);

    match state.reader.find_news(&user, query.cursor.as_deref(), take).await {
        Ok(page) => {
            let mut response = Json(page.publications).into_response();
            if let Some(cursor) = page.next_cursor {
                if let Ok(value) = HeaderValue::from_str(&cursor) {
                    response.headers_mut().insert(CURSOR_HEADER, value);
                }
            }
            response
        }
        Err(e) => {
            error!(user, error = %e, "Feed query failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// POST /migrator/users — full user resync in the background.
pub async fn migrate_users(State(state): State<Arc<AppState>>) -> StatusCode {
    let migrator = state.migrator.clone();
    tokio::spawn(async move { migrator.migrate_users().await });
    StatusCode::ACCEPTED
}

/// POST /migrator/users/{user} — resync one user in the background.
pub async fn migrate_user(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> StatusCode {
    let migrator = state.migrator.clone();
    tokio::spawn(async move { migrator.migrate_user(&user).await });
    StatusCode::ACCEPTED
}

/// POST /migrator/publications — full publication resync in the background.
pub async fn migrate_publications(State(state): State<Arc<AppState>>) -> StatusCode {
    let migrator = state.migrator.clone();
    tokio::spawn(async move { migrator.migrate_publications().await });
    StatusCode::ACCEPTED
}
