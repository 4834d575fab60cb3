//! Feature slices for the TUI (state/update/render per page).

pub mod feed;
pub mod login;
