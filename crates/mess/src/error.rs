//! Unified error type for the Mess server.

use mess_protocol::ProtocolError;
use mess_transport::TransportError;

/// Top-level error for the server and its connection tasks.
///
/// Binding failures surface from [`MessServerBuilder::build`]. A connection
/// task ends with one of these when its socket fails or an outbound message
/// cannot be encoded; the accept loop logs it and carries on.
///
/// Client mistakes (bad frames, illegal or out-of-turn moves) never become a
/// `MessError`: the dispatcher logs and drops them.
///
/// [`MessServerBuilder::build`]: crate::MessServerBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum MessError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An outbound message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
