//! Railway network CLI library.
//!
//! Logging setup and output rendering shared by the `railnet-cli` binary.

pub mod logging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
