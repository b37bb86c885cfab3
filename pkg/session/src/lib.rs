//! Session identity resolution for the TechOasis gateway.
//!
//! The backend issues an opaque `header.payload.signature` token at login
//! which the gateway stores in an HTTP-only cookie. This crate turns that
//! token back into a normalized identity (id, email, display name, role)
//! and decides where a user lands right after login. Everything here is a
//! pure function of the token string; nothing is cached between calls.

pub mod accessor;
pub mod claims;
pub mod cookie;
pub mod routing;
pub mod token;

pub use claims::{Identity, Role};
pub use routing::{Destination, ProfileLookup};
