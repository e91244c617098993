//! Error taxonomy for the RLC/MAC control core.

/// Flat error type shared by every subsystem (codecs, windows, allocator,
/// registry, TBF state machines). One enum keeps propagation boring: callers
/// match on the handful of kinds from spec rather than per-module error
/// types.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// Received bitstream fails CSN.1 / LI-chain validation. The block is
    /// dropped; no TBF state changes.
    #[error("malformed message: {0}")]
    Malformed(&'static str),

    /// Valid message selecting a variant this implementation does not
    /// emit or decode.
    #[error("unsupported variant: {0}")]
    Unsupported(&'static str),

    /// Allocator cannot satisfy a request.
    #[error("no resources available for allocation")]
    NoResources,

    /// MS already has an active TBF in the requested direction in a
    /// non-terminal state.
    #[error("resource busy: {0}")]
    Busy(&'static str),

    /// Poll or T-timer expired.
    #[error("timeout waiting for {0}")]
    Timeout(&'static str),

    /// Assertion failure in the bit packer: pre-rest block not
    /// octet-aligned, or a data-block offset mod 8 mismatch. Fatal to the
    /// current encode call only; the process does not abort.
    #[error("internal framing error: {0}")]
    InternalFraming(&'static str),

    /// A fixed-capacity destination buffer is too small for the message
    /// being encoded.
    #[error("buffer too small: need {needed}, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// `DlWindow::increment_send` called while the window is fully open.
    #[error("window stalled at distance {distance}")]
    WindowStalled { distance: u16 },
}

pub type CoreResult<T> = Result<T, CoreError>;
