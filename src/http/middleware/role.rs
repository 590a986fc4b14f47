//! Role attachment from a trusted header.
//!
//! Only for deployments where a fronting auth proxy sets the header and
//! strips it from client traffic. A role already attached by an in-process
//! authentication layer takes precedence.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    middleware::Next,
    response::Response,
};

use crate::security::identity::{AuthenticatedRole, Role};

pub async fn role_header_middleware(
    State(header): State<HeaderName>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.extensions().get::<AuthenticatedRole>().is_none() {
        let claimed = request
            .headers()
            .get(&header)
            .and_then(|value| value.to_str().ok())
            .map(|raw| raw.parse::<Role>());

        match claimed {
            Some(Ok(role)) => {
                request.extensions_mut().insert(AuthenticatedRole(role));
            }
            Some(Err(unknown)) => {
                tracing::debug!(header = %header, value = %unknown.0, "Unknown role, treating as guest");
            }
            None => {}
        }
    }

    next.run(request).await
}
