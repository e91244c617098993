//! RLC/MAC control core for a GPRS/EGPRS packet control unit: TBF lifecycle
//! management, the PDCH/TFI/USF allocator, and the CSN.1 message codecs that
//! sit below the BSSGP/Um interfaces.
//!
//! This crate is the control core only: it has no socket, timer, or VTY
//! surface of its own (see `BtsConfig` for the knobs a host process wires
//! up, and the crate-level `log` records instead of owning a transport).

pub mod alloc;
pub mod bits;
pub mod bts;
pub mod codec;
pub mod coding_scheme;
pub mod config;
pub mod error;
pub mod llc;
pub mod ms;
pub mod pdch;
pub mod rlc;
pub mod scheduler;
pub mod tbf;
pub mod trx;

pub use bts::Bts;
pub use config::{AllocAlgorithm, BtsConfig};
pub use error::{CoreError, CoreResult};
