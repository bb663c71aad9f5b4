//! # Todo Sync Engine
//!
//! Keeps a local todo store in step with a user-supplied backend.
//!
//! This crate provides:
//! - [`EventPublisher`], the store outbox that posts each mutation
//! - [`RemoteFetcher`], one snapshot read with a bounded retry
//! - [`Reconciler`], the additive id-based merge of a snapshot
//! - [`SyncEngine`], pull/push orchestration with a single-flight guard
//! - [`HttpTransport`] and [`MockTransport`] behind [`SyncTransport`]
//!
//! ## Model
//!
//! The local store is the source of truth. Mutations commit locally first
//! and are then published, best-effort. A pull only ever appends records
//! whose ids are unknown locally; a push sends the whole store in one
//! `sync` event. Network failures are reported, never fatal, and never
//! undo a local change.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod fetcher;
mod http;
mod notify;
mod publisher;
mod reconciler;
mod state;
mod transport;

pub use config::{EngineConfig, RetryConfig, DEFAULT_REQUEST_TIMEOUT, MAX_FETCH_ATTEMPTS};
pub use error::{SyncError, SyncResult};
pub use fetcher::RemoteFetcher;
pub use http::HttpTransport;
pub use notify::{MemoryNotifier, Notification, Notifier, TracingNotifier};
pub use publisher::{EventPublisher, PublishStats};
pub use reconciler::{diff, merge, ReconcileOutcome, ReconcilePlan, Reconciler};
pub use state::{PullOutcome, PushOutcome, SyncEligibility, SyncEngine, SyncState, SyncStats};
pub use transport::{Endpoint, MockTransport, SyncTransport};
