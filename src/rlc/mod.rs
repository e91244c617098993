//! RLC ARQ windows (§4.C): the downlink send/ack window and the uplink
//! receive window.

mod dl_window;
mod ul_window;

pub use dl_window::{DlSlotState, DlWindow};
pub use ul_window::{UlSlotState, UlWindow};
