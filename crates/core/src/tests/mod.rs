//! Test harness and fixtures shared by crates that build on the core types


pub use store::SessionStoreTestSuite;

use crate::{Session, TokenPair, User};

/// A complete session whose tokens carry the given rotation number
///
/// `sample_session(1)` holds `access-1` / `refresh-1` for `user-1`.
pub fn sample_session(generation: u32) -> Session {
    Session::new(
        TokenPair::new(format!("access-{generation}"), format!("refresh-{generation}")),
        User::new("user-1").with_name("Test User"),
    )
}
