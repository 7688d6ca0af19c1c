//! Cookie model (§3, §4.3): request-side `PlainCookie`, response-side
//! `SetCookie`, and the client-side persistent store. Generalizes the
//! teacher's request/response cookie helpers in the old `cookie.rs` into a
//! standalone sum type plus a thread-safe store, since this core's target is
//! an embeddable HTTP engine rather than a single always-server process.

pub mod grammar;
pub mod public_suffix;
pub mod store;

pub use grammar::{PlainCookie, SetCookie};
pub use store::{CookieStore, PersistentCookie};
