//! Auth provider integration module
//!
//! Provides the token-verification client for the Supabase auth API and the
//! process-wide handle that constructs it lazily.

pub mod client;
pub mod models;
pub mod provider;

pub use client::{ProviderError, SupabaseAuthClient, TokenVerifier};
pub use models::Principal;
pub use provider::AuthProvider;
