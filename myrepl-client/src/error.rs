use myrepl_core::packet::ErrPacket;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// state machine precondition violated by the embedder
    #[error("not connected")]
    NotConnected,
    #[error("not handshaked")]
    NotHandshaked,
    #[error("connect failed: {0}")]
    ConnectFailed(std::io::Error),
    /// an ERR packet arrived where a success was expected
    #[error("server returned error {code}: {message}")]
    ServerError { code: u16, message: String },
    /// the stream produced something other than what the state
    /// machine was waiting for
    #[error("unexpected packet: {0}")]
    UnexpectedPacket(String),
    #[error("packet out of order: got sequence {got}, expected {expected}")]
    PacketOutOfOrder { got: u8, expected: u8 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] wirebytes::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] myrepl_core::Error),
}

impl From<ErrPacket> for Error {
    fn from(err: ErrPacket) -> Self {
        Error::ServerError {
            code: err.error_code,
            message: err.message(),
        }
    }
}
