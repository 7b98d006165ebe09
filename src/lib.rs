//! Capture, organize and reflect on short free-form thoughts.
//!
//! Raw text goes to a language model that returns a title and tags. The result is kept
//! in an in-memory entity store and written through to a durable backing store. Tag
//! clouds, filters and the theme for a "thought of the day" are computed from that
//! store on demand, and the model can synthesize an answer across every thought.
//!
//! A session runs in one of two modes, chosen once at startup:
//!
//! | Mode | Identity | Backing store | Write style |
//! |------|----------|---------------|-------------|
//! | **Remote** | Signed-in user | SQLite document store | One upsert/delete per change |
//! | **Demo** | None | Two JSON slots on disk | Whole snapshot after every change |
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite connection setup, schema, and migrations for the document store
//! - [`enrichment`]: Model gateway (classify, synthesize, daily summary) and live transcription
//! - [`error`]: Typed errors for persistence, enrichment, and the session
//! - [`persistence`]: The persistence adapter and its remote and local implementations
//! - [`session`]: Mode selection, auth lifecycle, and the session controller
//! - [`thought`]: Entity types, the entity store, and derived views

pub mod config;
pub mod db;
pub mod enrichment;
pub mod error;
pub mod persistence;
pub mod session;
pub mod thought;
