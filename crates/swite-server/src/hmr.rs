//! Hot-reload push channel.
//!
//! Each stabilized file change is classified into a style swap, a hot
//! module re-import, or a full reload, then broadcast to every connected
//! browser as a small JSON payload over Server-Sent Events. SSE gives the
//! ordered, reliable, multi-subscriber fan-out the protocol needs; a
//! subscriber that reconnects performs a full reload to cover anything it
//! missed.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{sse, IntoResponse, Response, Sse},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use crate::state::SharedState;

/// URL of the push-channel client script.
pub const HMR_CLIENT_PATH: &str = "/__swite_hmr_client";

/// URL browsers open their event stream against.
pub const HMR_EVENTS_PATH: &str = "/__swite_hmr";

/// Extensions classified as stylesheets.
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass"];

/// Extensions eligible for hot module replacement.
const SCRIPT_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx", "ui", "uix"];

/// How a connected client should apply a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    /// Live stylesheet swap
    Style,
    /// Re-import the changed module with a cache-busting query
    Hot,
    /// Full document reload
    Reload,
}

/// Payload broadcast for one file change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(rename = "type")]
    pub kind: String,
    /// Absolute path of the changed file
    pub path: String,
    #[serde(rename = "updateType")]
    pub update_type: UpdateType,
    /// Epoch milliseconds
    pub timestamp: u64,
}

impl UpdatePayload {
    pub fn new(path: &Path, update_type: UpdateType) -> Self {
        Self {
            kind: "update".to_string(),
            path: path.to_string_lossy().into_owned(),
            update_type,
            timestamp: epoch_millis(),
        }
    }
}

/// Classify a changed file by extension and location.
pub fn classify_change(path: &Path) -> UpdateType {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let Some(ext) = ext else {
        return UpdateType::Reload;
    };

    if STYLE_EXTENSIONS.contains(&ext.as_str()) {
        return UpdateType::Style;
    }

    if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
        let path_str = path.to_string_lossy();
        if path_str.contains("/components/") || path_str.contains("/pages/") {
            return UpdateType::Hot;
        }
    }

    UpdateType::Reload
}

/// Serve the push-channel client script.
pub async fn handle_hmr_client() -> impl IntoResponse {
    const CLIENT_SCRIPT: &str = include_str!("../assets/hmr-client.js");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/javascript; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from(CLIENT_SCRIPT))
        .unwrap()
}

/// Handle SSE connections from browsers.
pub async fn handle_events(
    State(state): State<SharedState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<sse::Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::info!(client = id, "push-channel subscriber connected");

    let stream = ReceiverStream::new(rx).map(|data| Ok(sse::Event::default().data(data)));

    Sse::new(stream).keep_alive(
        sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn stylesheets_classify_as_style() {
        assert_eq!(
            classify_change(Path::new("/w/styles/main.css")),
            UpdateType::Style
        );
        assert_eq!(
            classify_change(Path::new("/w/styles/theme.scss")),
            UpdateType::Style
        );
    }

    #[test]
    fn component_and_page_scripts_classify_as_hot() {
        assert_eq!(
            classify_change(Path::new("/w/a/b/components/c.ts")),
            UpdateType::Hot
        );
        assert_eq!(
            classify_change(Path::new("/w/packages/ui/components/button.tsx")),
            UpdateType::Hot
        );
        assert_eq!(
            classify_change(Path::new("/w/src/pages/home.uix")),
            UpdateType::Hot
        );
    }

    #[test]
    fn everything_else_classifies_as_reload() {
        assert_eq!(classify_change(Path::new("/w/index.html")), UpdateType::Reload);
        // Script extension, but outside components/ and pages/
        assert_eq!(classify_change(Path::new("/w/src/util.ts")), UpdateType::Reload);
        assert_eq!(classify_change(Path::new("/w/README")), UpdateType::Reload);
    }

    #[test]
    fn payload_serializes_to_wire_shape() {
        let payload = UpdatePayload::new(
            &PathBuf::from("/w/packages/ui/components/button.tsx"),
            classify_change(Path::new("/w/packages/ui/components/button.tsx")),
        );
        let json = serde_json::to_string(&payload).unwrap();

        assert!(json.contains(r#""type":"update""#));
        assert!(json.contains(r#""updateType":"hot""#));
        assert!(json.contains(r#""path":"/w/packages/ui/components/button.tsx""#));
        assert!(json.contains(r#""timestamp":"#));
    }
}
