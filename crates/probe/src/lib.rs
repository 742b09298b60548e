//! Live HTTP probing of registered URLs.
//!
//! - [`initialize`]: fill in a new record from the live response.
//! - [`check`]: compare the live response against a stored record.
//!
//! Both go through a [`Transport`](transport::Transport), which never follows
//! redirects.

mod check;
pub mod error;
mod initialize;
pub mod media;
pub mod transport;

pub use crate::check::{CheckOptions, Finding, Verdict, check};
pub use crate::initialize::initialize;
