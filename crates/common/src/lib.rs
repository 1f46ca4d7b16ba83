//! Cross-cutting helpers shared by the binaries and test fixtures.

pub mod utils;
