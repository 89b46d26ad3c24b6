//! Common test utilities and fixtures for continuum integration tests
//!
//! This module provides:
//! - `TestProject` builder for creating project trees and running the CLI
//! - `FakeHost`, an in-memory analysis host with a type library
//! - `RecordingClient` and `LoopbackHub`, in-process transports

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod clients;
pub mod fake_host;
pub mod test_project;

pub use clients::{LoopbackHub, RecordingClient};
pub use fake_host::FakeHost;
pub use test_project::TestProject;
