//! Error conversion helpers shared across double-o crates.

mod boundary;
