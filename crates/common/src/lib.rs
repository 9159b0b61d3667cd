//! Identifier types shared by every order desk crate.

pub mod types;

pub use types::SessionId;
