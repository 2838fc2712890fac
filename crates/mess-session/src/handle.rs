//! The core's view of a connection: an identity plus a mailbox.

use std::hash::{Hash, Hasher};

use mess_protocol::ServerMessage;
use mess_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::SessionError;

/// Receiving end of a connection's mailbox, drained by its socket task.
pub type Outbox = mpsc::UnboundedReceiver<ServerMessage>;

/// An addressable participant.
///
/// Sending only pushes onto an unbounded channel, so it never waits on the
/// network; the connection's own task writes the frame. Two handles are
/// equal when they name the same connection, whatever their channels.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbox: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionHandle {
    /// Wraps an existing sender.
    pub fn new(
        id: ConnectionId,
        outbox: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self { id, outbox }
    }

    /// Creates a handle together with the receiver its messages land in.
    pub fn channel(id: ConnectionId) -> (Self, Outbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(id, tx), rx)
    }

    /// The connection this handle addresses.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a message for delivery.
    ///
    /// # Errors
    /// [`SessionError::Delivery`] if the connection's task has exited.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SessionError> {
        self.outbox
            .send(msg)
            .map_err(|_| SessionError::Delivery(self.id))
    }

    /// `true` once the receiving task has gone away.
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl Hash for ConnectionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
