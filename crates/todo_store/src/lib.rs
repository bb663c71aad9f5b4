//! # Todo Store
//!
//! The canonical, persisted local state of the todo manager.
//!
//! This crate provides:
//! - [`KeyValueBackend`], the host's persistent key-value storage
//! - [`LocalStore`], the only writer of the todo [`Store`] aggregate
//! - [`ConfigStore`], the persisted BYOB [`Config`] record
//! - Versioned record encoding with forward-only migrations
//!
//! ## Design Principles
//!
//! - Local-first: a mutation is validated, persisted and visible before any
//!   network activity it triggers
//! - All-or-nothing: a rejected mutation leaves memory and storage unchanged
//! - Backends are opaque byte stores keyed by fixed record names
//!
//! ## Example
//!
//! ```rust
//! use todo_store::{InMemoryBackend, LocalStore};
//! use todo_sync_protocol::{NewTodo, NewTodoList};
//!
//! let store = LocalStore::open(InMemoryBackend::new()).unwrap();
//! let list = store.add_todo_list(NewTodoList::new("Inbox", "")).unwrap();
//! let todo = store.add_todo(NewTodo::new("water plants")).unwrap();
//! assert_eq!(todo.todo_list_id, list.id);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod file;
mod memory;
mod record;
mod store;

pub use backend::KeyValueBackend;
pub use config::{Config, ConfigSource, ConfigStore, CONFIG_KEY};
pub use error::{StoreError, StoreResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use record::{load_record, save_record, Record, SCHEMA_VERSION};
pub use store::{LocalStore, Outbox, Store, STORE_KEY};
