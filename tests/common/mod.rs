//! Integration test common infrastructure.
//!
//! Provides a scripted IRC network to dial (plaintext or TLS) and a gateway harness around
//! a ConnectionManager with a memory raw log.

pub mod gateway;
pub mod server;
pub mod tls;

#[allow(unused_imports)]
pub use gateway::TestGateway;
#[allow(unused_imports)]
pub use server::{FakeNetwork, FakeSession};
