/// Errors that can occur while establishing or using the engine link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket handshake with the engine failed.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    /// The connector declined to produce a link.
    #[error("connection refused: {0}")]
    Refused(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
