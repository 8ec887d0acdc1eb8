use std::collections::VecDeque;
use std::io;
use std::time::Duration;

#[derive(Debug)]
enum Incoming {
    Chunk(Vec<u8>),
    Stall,
    Closed,
}

/// A socket replaying a fixed script of received chunks, recording everything sent to it.
///
/// Each `recv()` returns exactly one scripted chunk (truncated to the buffer if needed, with the
/// rest kept for the next call). Once the script is exhausted, reads time out.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSocket {
    incoming: VecDeque<Incoming>,
    pub sent: Vec<String>,
    pub timeouts: Vec<Duration>,
}

impl ScriptedSocket {
    pub fn new() -> ScriptedSocket {
        Default::default()
    }

    pub fn chunk(self, data: &str) -> Self {
        self.bytes(data.as_bytes())
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.incoming.push_back(Incoming::Chunk(data.to_vec()));
        self
    }

    /// Queue one `"1\n"` acknowledgment per command.
    pub fn acks(mut self, count: usize) -> Self {
        for _ in 0..count {
            self = self.chunk("1\n");
        }
        self
    }

    pub fn stall(mut self) -> Self {
        self.incoming.push_back(Incoming::Stall);
        self
    }

    pub fn closed(mut self) -> Self {
        self.incoming.push_back(Incoming::Closed);
        self
    }

    pub fn pending(&self) -> usize {
        self.incoming.len()
    }
}

impl super::Socket for ScriptedSocket {
    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.sent.push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }

    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        match self.incoming.pop_front() {
            Some(Incoming::Chunk(mut data)) => {
                let count = data.len().min(buffer.len());
                buffer[..count].copy_from_slice(&data[..count]);
                if count < data.len() {
                    self.incoming.push_front(Incoming::Chunk(data.split_off(count)));
                }
                Ok(count)
            }
            Some(Incoming::Closed) => Ok(0),
            Some(Incoming::Stall) | None =>
                Err(io::Error::new(io::ErrorKind::WouldBlock, "scripted stall")),
        }
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.timeouts.push(timeout);
        Ok(())
    }
}
