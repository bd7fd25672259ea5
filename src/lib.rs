#![cfg_attr(docsrs, feature(doc_cfg))]
//! # adbms_lib
//!
//! This crate implements the host side of the ADBMS6948 battery monitor
//! command/response protocol: the PEC15/PEC10 checksums, the frame layout for
//! a daisy chain of devices and the command catalog. The codec never touches
//! the bus; a [`transport::Transport`] does the actual exchange.
//!
//! ## Features
//!
//! - `default`: Enables `bin-dependencies`, which is intended for compiling the `adbms` command-line tool.
//!
//! ### Transport Features
//! - `embedded-hal`: Enables [`transport::SpiTransport`] for any `embedded-hal` 1.0 `SpiDevice`.
//!
//! ### Utility Features
//! - `serde`: Enables `serde` support for serializing the protocol data structures.
//! - `bin-dependencies`: Enables all features required by the `adbms` binary executable.

pub mod client;
/// The command catalog.
pub mod commands;
/// Contains error types for the library.
mod error;
pub mod pec;
/// Frame building and response parsing.
pub mod protocol;
pub mod transport;

pub use error::Error;
