//! # Job DataStore
//!
//! This module provides functionality for interacting with a SQLite database
//! to store and retrieve processing jobs and their per-stage checkpoints.
//!
//! The module uses sqlx for database operations and provides an abstraction layer
//! for CRUD operations on jobs and their associated checkpoints.

mod datastore;
mod domain;

pub use datastore::sqlite::SqliteJobStore;
pub use datastore::JobStore;
pub use domain::{Checkpoint, Job, JobStatus, Stage, UnknownVariant};
