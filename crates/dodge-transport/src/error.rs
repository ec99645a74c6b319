/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A length prefix was zero or larger than the frame limit.
    #[error("malformed frame: length {0}")]
    MalformedFrame(u32),

    /// An outbound payload does not fit in a single frame.
    #[error("frame too large: {0} bytes")]
    FrameTooLarge(usize),
}
