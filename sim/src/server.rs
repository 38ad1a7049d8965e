//! HTTP side of the simulator: the five RWS resources the monitor reads.
//!
//! Panel, RAPID and motion-system resources answer in the RWS 1.0 HTML
//! representation; I/O signals answer in JSON (the monitor always asks with
//! `?json=1`). Every request must carry Basic credentials.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::debug;

use crate::controller::{ControllerState, Resource};

pub type SharedState = Arc<RwLock<ControllerState>>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/rw/panel/ctrlstate/", get(ctrlstate))
        .route("/rw/panel/ctrlstate", get(ctrlstate))
        .route("/rw/rapid/execution", get(execution))
        .route("/rw/motionsystem/mechunits/:mechunit/robtarget", get(robtarget))
        .route("/rw/iosystem/signals/:name", get(signal))
        .with_state(state)
}

/// Serves until the listener fails.
pub async fn serve(listener: TcpListener, state: SharedState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Basic ") && v.len() > "Basic ".len())
        .unwrap_or(false)
}

/// Authorization, injected failures and delays shared by every resource.
async fn gate(state: &SharedState, headers: &HeaderMap, resource: Resource) -> Option<Response> {
    if !is_authorized(headers) {
        return Some(
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"validusers@robapi.abb\"")],
            )
                .into_response(),
        );
    }
    let delay = {
        let state = state.read().await;
        if state.is_failing(resource) {
            debug!("{:?} failing on purpose", resource);
            return Some(StatusCode::SERVICE_UNAVAILABLE.into_response());
        }
        state.delayed.filter(|(r, _)| *r == resource).map(|(_, d)| d)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    None
}

fn page(title: &str, items: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
         <head><title>{title}</title><base href=\"/rw/\"/></head>\n\
         <body>\n<div class=\"state\">\n<a href=\"\" rel=\"self\"></a>\n<ul>\n{items}\n</ul>\n</div>\n</body>\n</html>"
    )
}

async fn ctrlstate(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(rejection) = gate(&state, &headers, Resource::CtrlState).await {
        return rejection;
    }
    let motors_on = state.read().await.motors_on;
    let value = if motors_on { "motoron" } else { "motoroff" };
    Html(page(
        "panel",
        &format!(
            "<li class=\"pnl-ctrlstate\" title=\"ctrlstate\"><span class=\"ctrlstate\">{value}</span></li>"
        ),
    ))
    .into_response()
}

async fn execution(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(rejection) = gate(&state, &headers, Resource::Execution).await {
        return rejection;
    }
    let (class, value) = {
        let state = state.read().await;
        (state.exec_state_class.clone(), state.exec_state.as_str())
    };
    Html(page(
        "rapid",
        &format!(
            "<li class=\"rap-execution\" title=\"execution\"><span class=\"{class}\">{value}</span><span class=\"cycle\">forever</span></li>"
        ),
    ))
    .into_response()
}

async fn robtarget(
    State(state): State<SharedState>,
    Path(mechunit): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(rejection) = gate(&state, &headers, Resource::RobTarget).await {
        return rejection;
    }
    if mechunit != "ROB_1" {
        return StatusCode::NOT_FOUND.into_response();
    }
    let [x, y, z] = state.read().await.position;
    Html(page(
        "motionsystem",
        &format!(
            "<li class=\"ms-robtargets\" title=\"robtarget\">\
             <span class=\"x\">{x:.2}</span><span class=\"y\">{y:.2}</span><span class=\"z\">{z:.2}</span>\
             <span class=\"q1\">0.0</span><span class=\"q2\">0.0</span><span class=\"q3\">1.0</span><span class=\"q4\">0.0</span>\
             <span class=\"cf1\">0</span><span class=\"cf4\">0</span><span class=\"cf6\">0</span><span class=\"cfx\">0</span></li>"
        ),
    ))
    .into_response()
}

async fn signal(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let (resource, lvalue, kind) = {
        let state = state.read().await;
        if name == state.gripper_signal {
            (Resource::Gripper, state.gripper_lvalue(), "DI")
        } else if name == state.speed_signal {
            (Resource::TcpSpeed, format!("{:.3}", state.tcp_speed), "AO")
        } else {
            return StatusCode::NOT_FOUND.into_response();
        }
    };
    if let Some(rejection) = gate(&state, &headers, resource).await {
        return rejection;
    }
    Json(json!({
        "_links": { "base": { "href": "/rw/iosystem/" } },
        "_embedded": {
            "_state": [{
                "_type": "ios-signal-li",
                "_title": name,
                "name": name,
                "type": kind,
                "category": "",
                "lvalue": lvalue,
                "lstate": "not simulated"
            }]
        }
    }))
    .into_response()
}
