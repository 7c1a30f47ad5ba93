//! Authentication middleware
//!
//! Extracts a bearer token, verifies it with the auth provider and exposes
//! the resulting principal to handlers. Every failure is answered with a 401
//! here; nothing is propagated to generic error handling.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::{
    error::AppError,
    routes::metrics,
    supabase::{AuthProvider, Principal, ProviderError},
};

/// `Bearer <token>`, scheme case-insensitive, any whitespace run in between
static BEARER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^bearer\s+(\S+)$").unwrap());

/// Three base64url segments separated by dots (header.payload.signature)
static JWT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$").unwrap());

/// Authenticated principal attached to the request
///
/// Inserted into request extensions by [`require_auth`]; handlers behind it
/// can take it as an extractor.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::AuthRequired)
    }
}

/// Why a token was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not shaped like a signed token; provider was not contacted
    Malformed,
    /// Provider answered with an error
    ProviderRejected,
    /// Provider answered without a user
    NoPrincipal,
    /// Provider could not be reached, timed out, was misconfigured or failed
    ProviderUnavailable,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::Malformed => "malformed",
            RejectReason::ProviderRejected => "provider_rejected",
            RejectReason::NoPrincipal => "no_principal",
            RejectReason::ProviderUnavailable => "provider_unavailable",
        }
    }
}

/// Result of verifying a token
///
/// Anything short of a principal vouched for by the provider is `Rejected`.
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    Verified(Principal),
    Rejected(RejectReason),
}

impl VerificationOutcome {
    pub fn into_principal(self) -> Option<Principal> {
        match self {
            VerificationOutcome::Verified(principal) => Some(principal),
            VerificationOutcome::Rejected(_) => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified(_))
    }
}

/// Extract the bearer token from an Authorization header value
pub fn extract_bearer_token(auth_header: Option<&str>) -> Option<&str> {
    let captures = BEARER_PATTERN.captures(auth_header?)?;
    captures.get(1).map(|m| m.as_str())
}

/// Whether `token` has the three-segment shape of a signed token
pub fn is_jwt_shaped(token: &str) -> bool {
    JWT_PATTERN.is_match(token)
}

/// Verify a token with the auth provider
///
/// Malformed tokens are rejected without a provider round-trip. Provider
/// errors, timeouts and panics all resolve to `Rejected`.
pub async fn validate_token(provider: &AuthProvider, token: &str) -> VerificationOutcome {
    if !is_jwt_shaped(token) {
        return VerificationOutcome::Rejected(RejectReason::Malformed);
    }

    let verifier = match provider.verifier() {
        Ok(verifier) => verifier,
        Err(e) => {
            warn!(error = %e, "Auth provider unavailable");
            return VerificationOutcome::Rejected(RejectReason::ProviderUnavailable);
        }
    };

    let result = AssertUnwindSafe(verifier.get_user(token))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(Some(principal))) => VerificationOutcome::Verified(principal),
        Ok(Ok(None)) => VerificationOutcome::Rejected(RejectReason::NoPrincipal),
        Ok(Err(ProviderError::Rejected { status, .. })) => {
            debug!(status, provider = verifier.name(), "Token rejected by auth provider");
            VerificationOutcome::Rejected(RejectReason::ProviderRejected)
        }
        Ok(Err(e)) => {
            warn!(error = %e, provider = verifier.name(), "Token verification failed");
            VerificationOutcome::Rejected(RejectReason::ProviderUnavailable)
        }
        Err(_) => {
            warn!(provider = verifier.name(), "Token verifier panicked");
            VerificationOutcome::Rejected(RejectReason::ProviderUnavailable)
        }
    }
}

/// Authentication middleware
///
/// 1. Extracts the bearer token (401 `AUTH_REQUIRED` when absent)
/// 2. Verifies it with the auth provider (401 `INVALID_TOKEN` when rejected)
/// 3. Adds [`AuthenticatedUser`] to request extensions and runs the handler
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn require_auth(
    State(provider): State<Arc<AuthProvider>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    // Owned so no borrow of the request is held across the provider call
    let Some(token) = extract_bearer_token(auth_header).map(str::to_owned) else {
        debug!("Missing or malformed Authorization header");
        metrics::record_auth_outcome("missing");
        return Err(AppError::AuthRequired);
    };

    let principal = match validate_token(&provider, &token).await {
        VerificationOutcome::Verified(principal) => principal,
        VerificationOutcome::Rejected(reason) => {
            debug!(reason = reason.as_str(), "Authentication rejected");
            metrics::record_auth_outcome(reason.as_str());
            return Err(AppError::InvalidToken);
        }
    };

    debug!(user_id = %principal.id, "User authenticated successfully");
    metrics::record_auth_outcome("verified");

    request.extensions_mut().insert(AuthenticatedUser(principal));

    Ok(next.run(request).await)
}
