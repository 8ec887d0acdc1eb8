mod sys;
mod status;
mod config;
mod params;
mod analyzer;
mod gateware;
mod flash;
mod sweep;
pub mod output;

use std::io;
use std::time::Duration;

#[derive(Debug)]
pub enum Error {
    Configuration(String),
    Protocol(String),
    Timeout(Duration),
    Disconnected,
    ExternalStep { step: &'static str, detail: String },
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Configuration(reason) =>
                write!(f, "invalid configuration: {}", reason),
            Self::Protocol(reason) =>
                write!(f, "instrument protocol error: {}", reason),
            Self::Timeout(window) =>
                write!(f, "no response from instrument within {:?}", window),
            Self::Disconnected =>
                write!(f, "instrument closed the connection"),
            Self::ExternalStep { step, detail } =>
                write!(f, "{} failed: {}", step, detail),
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Io(ref io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset |
            io::ErrorKind::ConnectionAborted | io::ErrorKind::BrokenPipe =>
                Error::Disconnected,
            _ => Error::Io(error),
        }
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use sys::{
    Socket,
    TcpSocket,
    SCPI_PORT,
};

pub use status::EventStatus;

pub use config::{
    SaSettings,
    Trace,
    BANDWIDTHS,
    TRACE_POINTS,
};

pub use params::{
    PllField,
    PllSettings,
    CLKI_FREQUENCY,
};

pub use analyzer::{
    Analyzer,
    ScopedTimeout,
    COMMAND_TIMEOUT,
    REFERENCE_LEVEL,
    SWEEP_TIME_FLOOR,
};

pub use flash::{
    Flasher,
    Toolchain,
};

pub use sweep::{
    Instrument,
    Sweep,
    SETTLE_DELAY,
    SweepOutcome,
    SweepPoint,
};
