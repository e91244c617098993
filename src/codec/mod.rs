//! RLC/MAC control-plane message codecs (spec §4.B).
//!
//! Each submodule is grounded in a corresponding `Encoding::write_*`
//! function from `original_source/src/encoding.cpp`; see DESIGN.md for the
//! per-module grounding ledger and the Open Question decisions made where
//! that source was itself incomplete, version-skewed, or marked
//! unsupported upstream.

pub mod ack_nack;
pub mod channel_request;
pub mod data_header;
pub mod downlink_assignment;
pub mod immediate_assignment;
pub mod ms_radio_access_capability;
pub mod paging;
pub mod ts_reconfigure;
pub mod uplink_assignment;
