//! Chat-bot command surfaces over the portal data.
//!
//! The chat platforms' transports are external; both surfaces are delivered
//! as HTTP dispatch endpoints and answer synchronously against the store.

pub mod discord;
pub mod slack;
