//! Data models for the Lodge portal.
//!
//! These models match the frontend interfaces exactly for seamless
//! interoperability.

mod feed;
mod member;
mod project;
mod store;
mod team;

pub use feed::*;
pub use member::*;
pub use project::*;
pub use store::*;
pub use team::*;
