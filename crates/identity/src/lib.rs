//! Client for a GoTrue-compatible auth REST API (the Supabase auth service).

mod client;
mod error;

pub use client::{IdentityClient, IdentityUser, Session};
pub use error::IdentityError;
