use std::fmt::{Display, Formatter};
use std::io;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// A tracer error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A tracer error.
///
/// Of these only [`Error::MalformedHeader`] is recovered from during a trace, the hop on which it
/// occurs is treated as unanswered.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid config: {0}")]
    BadConfig(String),
    #[error("malformed header: {0}")]
    MalformedHeader(#[from] syntrace_packet::error::Error),
    #[error("transport error: {0}")]
    TransportError(#[from] IoError),
    #[error("unknown interface: {0}")]
    UnknownInterface(String),
    #[error("source IP address {0} could not be bound")]
    InvalidSourceAddr(IpAddr),
    #[error("unsupported address {0}, only IPv4 is supported")]
    UnsupportedAddr(IpAddr),
    #[error("missing address from socket call")]
    MissingAddr,
    #[error("no listener is open for the current hop")]
    NoListener,
}

/// Custom IO error result.
pub type IoResult<T> = std::result::Result<T, IoError>;

/// Custom IO error.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Bind error for {1}: {0}")]
    Bind(io::Error, SocketAddr),
    #[error("Connect error for {1}: {0}")]
    Connect(io::Error, SocketAddr),
    #[error("Sendto error for {1}: {0}")]
    SendTo(io::Error, SocketAddr),
    #[error("Failed to {0}: {1}")]
    Other(io::Error, IoOperation),
}

/// Io operation.
#[derive(Debug)]
pub enum IoOperation {
    NewSocket,
    Poll,
    Recv,
    LocalAddr,
    SetHeaderIncluded,
}

impl Display for IoOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewSocket => write!(f, "create new socket"),
            Self::Poll => write!(f, "poll"),
            Self::Recv => write!(f, "recv"),
            Self::LocalAddr => write!(f, "local addr"),
            Self::SetHeaderIncluded => write!(f, "set header included"),
        }
    }
}
