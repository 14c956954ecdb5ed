//! Integration test common infrastructure.
//!
//! Provides a scripted IRC peer that integration tests drive by hand.

pub mod server;

#[allow(unused_imports)]
pub use server::{TestPeer, TestServer};
