use std::io;
use std::time::Duration;

/// Byte stream connection to an instrument.
pub trait Socket {
    /// Write all of `data` as a single message.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;
    /// Receive whatever is available, blocking until at least one byte arrives, the peer closes
    /// the connection (returns `Ok(0)`), or the read timeout elapses.
    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize>;
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

/// TCP port of the raw SCPI socket service.
pub const SCPI_PORT: u16 = 5025;

mod tcp;

pub use tcp::TcpSocket;

#[cfg(test)]
pub(crate) mod mock;
