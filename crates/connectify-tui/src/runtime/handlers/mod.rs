//! Effect handlers.
//!
//! Each handler is a plain async function that performs one request and
//! returns the `UiEvent` describing its outcome. Spawning and task lifecycle
//! live in the runtime.

pub mod auth;
pub mod feed;
