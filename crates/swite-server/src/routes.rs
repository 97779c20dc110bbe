//! Route table endpoint.
//!
//! The route scanner collaborator enumerates `(path, file)` pairs; the
//! server keeps the latest list and serializes it at `/__swite_routes`.

use axum::{extract::State, response::IntoResponse, Json};

use crate::compiler::RouteScanner;
use crate::state::SharedState;

/// Replace the served route table with a fresh scan.
pub fn install_routes(state: &SharedState, scanner: &dyn RouteScanner) {
    let routes = scanner.routes();
    tracing::debug!(count = routes.len(), "route table updated");
    *state.routes.write() = routes;
}

/// Serve the serialized route table.
pub async fn handle_routes(State(state): State<SharedState>) -> impl IntoResponse {
    let routes = state.routes.read().clone();
    Json(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RouteEntry;
    use std::path::PathBuf;

    struct FixedScanner;

    impl RouteScanner for FixedScanner {
        fn routes(&self) -> Vec<RouteEntry> {
            vec![RouteEntry {
                path: "/users/:id".to_string(),
                file: PathBuf::from("/app/src/pages/user.uix"),
            }]
        }
    }

    #[test]
    fn install_routes_replaces_table() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = crate::config::DevConfig::load(temp.path().to_path_buf(), Some(0)).unwrap();
        let state = std::sync::Arc::new(crate::state::DevState::new(
            config,
            std::sync::Arc::new(crate::testing::EchoCompiler),
            std::sync::Arc::new(crate::compiler::PassthroughTransformer),
        ));

        install_routes(&state, &FixedScanner);
        let routes = state.routes.read().clone();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/users/:id");
    }
}
