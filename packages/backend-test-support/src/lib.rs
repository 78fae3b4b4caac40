//! Test support utilities shared by the cagematch integration test binaries.

pub mod logging;
