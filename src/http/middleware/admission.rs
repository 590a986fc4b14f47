//! Admission middleware.
//! Runs the admission decision before any downstream handler.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;

use crate::http::response::denial_response;
use crate::security::admission::{AdmissionController, AdmissionRequest};
use crate::security::decision::Decision;
use crate::security::identity::AuthenticatedRole;

fn admission_request(request: &Request<Body>) -> AdmissionRequest {
    let url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    AdmissionRequest {
        method: request.method().clone(),
        url,
        headers: request.headers().clone(),
        remote_addr: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr),
        role: request
            .extensions()
            .get::<AuthenticatedRole>()
            .map(|AuthenticatedRole(role)| *role),
    }
}

pub async fn admission_middleware(
    State(controller): State<Arc<AdmissionController>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if controller.test_mode() {
        return next.run(request).await;
    }

    let admission = admission_request(&request);
    let decision = match AssertUnwindSafe(controller.admit(admission))
        .catch_unwind()
        .await
    {
        Ok(decision) => decision,
        Err(_) => {
            tracing::error!(path = %request.uri().path(), "Admission check panicked");
            Decision::internal_error()
        }
    };

    if decision.allowed {
        next.run(request).await
    } else {
        denial_response(&decision)
    }
}
