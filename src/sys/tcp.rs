use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct TcpSocket {
    stream: TcpStream,
}

impl TcpSocket {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<TcpSocket> {
        let mut last_error = None;
        for addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    log::debug!("connected to {}", addr);
                    stream.set_nodelay(true)?;
                    return Ok(TcpSocket { stream })
                }
                Err(error) => {
                    log::debug!("cannot connect to {}: {}", addr, error);
                    last_error = Some(error)
                }
            }
        }
        Err(last_error.unwrap_or_else(||
            io::Error::new(io::ErrorKind::NotFound, "address did not resolve")))
    }
}

impl super::Socket for TcpSocket {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buffer)
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.stream.set_read_timeout(Some(timeout))?;
        self.stream.set_write_timeout(Some(timeout))
    }
}
