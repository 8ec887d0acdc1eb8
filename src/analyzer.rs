use std::io;
use std::net::ToSocketAddrs;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crate::{Error, Result};
use crate::config::{SaSettings, Trace, TRACE_POINTS};
use crate::status::EventStatus;
use crate::sys::{Socket, TcpSocket};

/// Read timeout for command acknowledgments and ordinary queries.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(1);

/// Lower bound on the sweep time used to derive the sweep timeout, in seconds.
pub const SWEEP_TIME_FLOOR: f64 = 5.0;
const SWEEP_TIMEOUT_FACTOR: f64 = 1.2;

/// Reference level of the display, in dBm.
pub const REFERENCE_LEVEL: f64 = 0.0;

const RECV_CHUNK: usize = 4096;

/// A spectrum analyzer driven over a raw SCPI socket.
///
/// Every command is followed by `*OPC?` and waits for the instrument to acknowledge it, so by
/// the time a method returns the instrument has finished acting on it.
#[derive(Debug)]
pub struct Analyzer<S: Socket> {
    socket: S,
    settings: SaSettings,
    timeout: Duration,
    // bytes received past the end of the last returned line
    pending: Vec<u8>,
}

impl Analyzer<TcpSocket> {
    pub fn connect<A: ToSocketAddrs>(addr: A, settings: SaSettings) -> Result<Analyzer<TcpSocket>> {
        settings.validate()?;
        let socket = TcpSocket::connect(addr)?;
        Analyzer::new(socket, settings)
    }
}

impl<S: Socket> Analyzer<S> {
    pub fn new(socket: S, settings: SaSettings) -> Result<Analyzer<S>> {
        settings.validate()?;
        let mut analyzer = Analyzer {
            socket,
            settings,
            timeout: COMMAND_TIMEOUT,
            pending: Vec::new(),
        };
        analyzer.set_timeout(COMMAND_TIMEOUT)?;
        Ok(analyzer)
    }

    pub fn settings(&self) -> &SaSettings {
        &self.settings
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        log::trace!("set_timeout({:?})", timeout);
        self.socket.set_timeout(timeout)?;
        self.timeout = timeout;
        Ok(())
    }

    /// Use `timeout` for reads until the returned guard is dropped.
    pub fn with_timeout(&mut self, timeout: Duration) -> Result<ScopedTimeout<'_, S>> {
        let previous = self.timeout;
        self.set_timeout(timeout)?;
        Ok(ScopedTimeout { analyzer: self, previous })
    }

    fn io_error(&self, error: io::Error) -> Error {
        match error.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut =>
                Error::Timeout(self.timeout),
            _ => error.into(),
        }
    }

    fn send(&mut self, message: &str) -> Result<()> {
        log::trace!("send({:?})", message);
        self.socket.send(message.as_bytes()).map_err(|error| self.io_error(error))
    }

    /// Receive one line, without its terminator.
    ///
    /// Reads until a `\n` has arrived, however many reads that takes. Anything received after
    /// the first `\n` is kept and becomes the beginning of the next line.
    fn recv_line(&mut self) -> Result<String> {
        let mut chunk = [0u8; RECV_CHUNK];
        let mut scanned = 0;
        loop {
            if let Some(offset) = self.pending[scanned..].iter().position(|&byte| byte == b'\n') {
                let rest = self.pending.split_off(scanned + offset + 1);
                let mut line = std::mem::replace(&mut self.pending, rest);
                line.pop();
                return String::from_utf8(line)
                    .map_err(|_| Error::Protocol("response is not valid UTF-8".to_owned()))
            }
            scanned = self.pending.len();
            let count = self.socket.recv(&mut chunk).map_err(|error| self.io_error(error))?;
            if count == 0 {
                return Err(Error::Disconnected)
            }
            log::trace!("recv({:?})", String::from_utf8_lossy(&chunk[..count]));
            self.pending.extend_from_slice(&chunk[..count]);
        }
    }

    /// Send `command` and wait until the instrument reports that it has completed.
    pub fn command(&mut self, command: &str) -> Result<()> {
        log::debug!("command({:?})", command);
        self.send(&format!("{};*OPC?\n", command))?;
        let response = self.recv_line()?;
        if response != "1" {
            return Err(Error::Protocol(format!(
                "{:?} acknowledged with {:?} instead of \"1\"", command, response)))
        }
        Ok(())
    }

    pub fn query(&mut self, query: &str) -> Result<String> {
        self.send(&format!("{}\n", query))?;
        let response = self.recv_line()?;
        if response.len() > 64 {
            let head = response.chars().take(64).collect::<String>();
            log::debug!("query({:?}) = {:?}... ({} bytes)", query, head, response.len());
        } else {
            log::debug!("query({:?}) = {:?}", query, response);
        }
        Ok(response)
    }

    pub fn identify(&mut self) -> Result<String> {
        self.query("*IDN?")
    }

    pub fn event_status(&mut self) -> Result<EventStatus> {
        let response = self.query("*ESR?")?;
        let bits = response.trim().parse::<u8>()
            .map_err(|_| Error::Protocol(format!("malformed event status {:?}", response)))?;
        Ok(EventStatus::from_bits_retain(bits))
    }

    /// Put the instrument into a known state matching `settings()`, ready for single sweeps.
    pub fn configure(&mut self) -> Result<()> {
        let settings = self.settings;
        let sequence = [
            ":SYSTem:PRESet".to_owned(),
            "*CLS".to_owned(),
            ":INITiate:CONTinuous OFF".to_owned(),
            format!(":FREQuency:CENTer {} Hz", settings.freq_center),
            format!(":FREQuency:SPAN {} Hz", settings.freq_span),
            format!(":DISPlay:WINdow:TRACe:Y:RLEVel {} dBm", REFERENCE_LEVEL),
            // must be disabled before an explicit attenuation sticks
            ":POWer:ATTenuation:AUTO OFF".to_owned(),
            format!(":POWer:ATTenuation {}", settings.attenuation),
            ":SWEep:TIME:AUTO ON".to_owned(),
            ":SWEep:COUNt 1".to_owned(),
            ":BWIDth:AUTO OFF".to_owned(),
            ":BWIDth:VIDeo:AUTO OFF".to_owned(),
            format!(":BWIDth {} Hz", settings.rbw),
            format!(":BWIDth:VIDeo {} Hz", settings.vbw),
        ];
        for command in sequence.iter() {
            self.command(command)?;
        }

        let errors = self.event_status()?.errors();
        if !errors.is_empty() {
            return Err(Error::Protocol(format!("instrument rejected configuration: {:?}", errors)))
        }
        log::info!("configured analyzer: {:?}", settings);
        Ok(())
    }

    /// Sweep duration the instrument has chosen for the current settings, in seconds.
    pub fn sweep_time(&mut self) -> Result<f64> {
        let response = self.query(":SWEep:TIME?")?;
        match response.trim().parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
            _ => Err(Error::Protocol(format!("malformed sweep time {:?}", response))),
        }
    }

    /// Run a single sweep and read back the trace.
    pub fn measure(&mut self) -> Result<Trace> {
        let sweep_time = self.sweep_time()?;
        let timeout = sweep_timeout(sweep_time)?;
        log::debug!("sweep time {}s, waiting up to {:?}", sweep_time, timeout);
        {
            let mut analyzer = self.with_timeout(timeout)?;
            analyzer.command(":INITiate:IMMediate")?;
        }

        let samples = parse_trace(&self.query(":TRACe:DATA? 1")?)?;
        if samples.len() != TRACE_POINTS {
            log::warn!("expected {} trace points, got {}", TRACE_POINTS, samples.len());
        }
        Ok(Trace::new(&self.settings, samples))
    }
}

/// Read timeout that tolerates one full sweep of `sweep_time` seconds.
pub(crate) fn sweep_timeout(sweep_time: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(sweep_time.max(SWEEP_TIME_FLOOR) * SWEEP_TIMEOUT_FACTOR)
        .map_err(|_| Error::Protocol(format!("sweep time {}s out of range", sweep_time)))
}

/// Parse a comma separated list of samples. The field after the last comma is discarded.
pub(crate) fn parse_trace(payload: &str) -> Result<Vec<f64>> {
    let mut fields = payload.split(',').collect::<Vec<_>>();
    if let Some(last) = fields.pop() {
        if !last.trim().is_empty() {
            log::warn!("discarding trailing trace field {:?}", last);
        }
    }
    fields.into_iter()
        .map(|field| field.trim().parse::<f64>()
            .map_err(|_| Error::Protocol(format!("malformed trace sample {:?}", field))))
        .collect()
}

/// Restores the previous read timeout of an `Analyzer` when dropped.
#[derive(Debug)]
pub struct ScopedTimeout<'a, S: Socket> {
    analyzer: &'a mut Analyzer<S>,
    previous: Duration,
}

impl<S: Socket> Deref for ScopedTimeout<'_, S> {
    type Target = Analyzer<S>;

    fn deref(&self) -> &Self::Target {
        &*self.analyzer
    }
}

impl<S: Socket> DerefMut for ScopedTimeout<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.analyzer
    }
}

impl<S: Socket> Drop for ScopedTimeout<'_, S> {
    fn drop(&mut self) {
        if let Err(error) = self.analyzer.set_timeout(self.previous) {
            log::warn!("failed to restore timeout of {:?}: {}", self.previous, error);
        }
    }
}
