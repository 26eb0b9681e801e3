use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::{debug, info};

use super::gate::Decision;

pub async fn access_gate_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    // 1. Read the session cookie
    let token = jar.get(state.gate.cookie_name()).map(|c| c.value());

    // 2. Resolve the viewer & decide
    let viewer = state.gate.resolve(token);
    let path = request.uri().path();

    match state.gate.decide_for(path, viewer) {
        Decision::Allow => {
            debug!(name: "gate.allow", path = %path, viewer = ?viewer, "Request allowed");
            // 3. Expose the viewer to handlers
            request.extensions_mut().insert(viewer);
            next.run(request).await
        }
        Decision::Redirect(target) => {
            info!(
                name: "gate.redirect",
                path = %path,
                viewer = ?viewer,
                target = %target,
                "Request redirected"
            );
            Redirect::temporary(&target).into_response()
        }
    }
}
