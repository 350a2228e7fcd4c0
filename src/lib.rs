//! A bounded asynchronous connection pool for MySQL-family databases.
//!
//! The pool is agnostic to the wire protocol: a driver plugs in by
//! implementing the [`Session`] and [`Connect`] traits, and callers borrow
//! live sessions through [`Pool::acquire`]. Borrowed sessions return to the
//! pool when the handle is dropped.

/// Pool parameters, builder API, and the configuration-file loader.
mod config;
/// Error types and result helpers.
pub mod error;
/// Connection pool implementation.
mod pool;
/// Driver-facing session traits.
mod session;

pub use crate::{
    config::{Credentials, Endpoint, PoolConfig},
    error::{BoxDynError, Error, Result},
    pool::{Pool, PoolSession},
    session::{Connect, QueryResult, Session},
};
