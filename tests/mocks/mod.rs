//! Mock infrastructure for testing external services
//!
//! Provides a wiremock-based stand-in for the Supabase auth API, the only
//! external service the server calls.

#![allow(dead_code)]

pub mod supabase;

pub use supabase::*;
