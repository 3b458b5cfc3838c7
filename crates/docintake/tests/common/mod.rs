//! Shared utilities for docintake integration tests.
//!
//! - `MockWebhook`: an axum server standing in for the rename/classify webhook
//! - `MockSupabase`: an axum server recording Storage and PostgREST calls
//! - `TestHarness`: a `DocIntake` wired to the mock, an in-memory store and a
//!   temporary SQLite history

#![allow(unused_imports)]

pub mod harness;
pub mod mock_supabase;
pub mod mock_webhook;

pub use harness::TestHarness;
pub use mock_supabase::{MockSupabase, RecordedCall};
pub use mock_webhook::{MockWebhook, RecordedRequest, Reply};
