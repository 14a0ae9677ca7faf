//! The serial link to the lamp: frames out, text lines in.

use std::io::{self, Read, Write};

use log::{debug, info, trace};
use serialport::{SerialPort, SerialPortBuilder};

use crate::config::PortConfig;
use crate::error::LinkError;
use crate::frame::{Command, Frame, Rgb};

const READ_CHUNK: usize = 128;

/// Longest line handed back; longer device output is split at this length.
pub const MAX_LINE_LEN: usize = 1024;
/// Most lines a single [`Lamp::drain`] call returns.
pub const DRAIN_LIMIT: usize = 64;

/// A lamp reachable over a byte stream, usually a serial port.
pub struct Lamp<P> {
    port: P,
    // Bytes received but not yet returned as a complete line.
    pending: Vec<u8>,
    // A read failure held back until the lines received before it are returned.
    deferred: Option<LinkError>,
}

impl Lamp<Box<dyn SerialPort>> {
    /// Opens the serial device described by `config`.
    pub fn open(config: &PortConfig) -> Result<Self, LinkError> {
        info!(
            "opening {} at {} baud (timeout {:?}, exclusive {})",
            config.path, config.baud_rate, config.timeout, config.exclusive
        );
        let builder = serialport::new(config.path.as_str(), config.baud_rate).timeout(config.timeout);
        let port = open_port(builder, config.exclusive).map_err(|source| LinkError::Open {
            path: config.path.clone(),
            source,
        })?;
        Ok(Self::new(port))
    }
}

#[cfg(unix)]
fn open_port(builder: SerialPortBuilder, exclusive: bool) -> serialport::Result<Box<dyn SerialPort>> {
    let mut port = builder.open_native()?;
    port.set_exclusive(exclusive)?;
    Ok(Box::new(port))
}

#[cfg(not(unix))]
fn open_port(builder: SerialPortBuilder, _exclusive: bool) -> serialport::Result<Box<dyn SerialPort>> {
    builder.open()
}

impl<P: Read + Write> Lamp<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            pending: Vec::new(),
            deferred: None,
        }
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    /// Writes the command's frame in full and flushes it.
    pub fn send(&mut self, command: Command) -> Result<Frame, LinkError> {
        let frame = command.frame();
        debug!("-> [{frame}]");
        self.port.write_all(frame.as_bytes())?;
        self.port.flush()?;
        Ok(frame)
    }

    pub fn set_color(&mut self, color: Rgb) -> Result<Frame, LinkError> {
        self.send(Command::Color(color))
    }

    pub fn set_level(&mut self, level: u8) -> Result<Frame, LinkError> {
        self.send(Command::Level(level))
    }

    /// Returns the next complete line without its line ending.
    ///
    /// A read timeout yields `Ok(None)`; bytes of an unfinished line stay
    /// buffered for the next call. At end of stream an unterminated tail is
    /// returned first, then `LinkError::Disconnected`.
    pub fn next_line(&mut self) -> Result<Option<String>, LinkError> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            if let Some(err) = self.deferred.take() {
                return Err(err);
            }

            let mut chunk = [0u8; READ_CHUNK];
            match self.port.read(&mut chunk) {
                Ok(0) if self.pending.is_empty() => return Err(LinkError::Disconnected),
                Ok(0) => {
                    self.deferred = Some(LinkError::Disconnected);
                    let tail = std::mem::take(&mut self.pending);
                    return Ok(Some(String::from_utf8_lossy(&tail).into_owned()));
                }
                Ok(n) => {
                    trace!("<- {n} bytes");
                    self.pending.extend_from_slice(&chunk[..n]);
                }
                Err(ref e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    return Ok(None)
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => (),
                Err(e) => return Err(LinkError::Io(e)),
            }
        }
    }

    /// Collects the lines available before the next read timeout, at most
    /// [`DRAIN_LIMIT`] per call.
    ///
    /// A read error hit after some lines were collected is returned by the
    /// following call, so no received line is lost.
    pub fn drain(&mut self) -> Result<Vec<String>, LinkError> {
        let mut lines = Vec::new();
        while lines.len() < DRAIN_LIMIT {
            match self.next_line() {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => break,
                Err(e) if lines.is_empty() => return Err(e),
                Err(e) => {
                    self.deferred = Some(e);
                    break;
                }
            }
        }
        Ok(lines)
    }

    /// Reads lines and hands each to `on_line`.
    ///
    /// Runs until `limit` lines were seen, or forever when `limit` is `None`.
    /// Returns the number of lines handled.
    pub fn monitor<F>(&mut self, limit: Option<usize>, mut on_line: F) -> Result<usize, LinkError>
    where
        F: FnMut(&str),
    {
        let mut seen = 0;
        while limit.map_or(true, |limit| seen < limit) {
            if let Some(line) = self.next_line()? {
                on_line(&line);
                seen += 1;
            }
        }
        Ok(seen)
    }

    fn take_line(&mut self) -> Option<String> {
        let end = match self.pending.iter().position(|&b| b == b'\n') {
            Some(newline) if newline < MAX_LINE_LEN => newline + 1,
            _ if self.pending.len() >= MAX_LINE_LEN => MAX_LINE_LEN,
            _ => return None,
        };
        let mut raw: Vec<u8> = self.pending.drain(..end).collect();
        if raw.last() == Some(&b'\n') {
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
        }
        Some(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// In-memory stand-in for a serial port. Each scripted read returns one
    /// chunk or one error; an exhausted script reads as end of stream, or
    /// repeats `endless` forever when set.
    #[derive(Default)]
    struct FakePort {
        reads: VecDeque<io::Result<Vec<u8>>>,
        endless: Option<Vec<u8>>,
        written: Vec<u8>,
        flushes: usize,
    }

    impl FakePort {
        fn with_reads(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
                ..Self::default()
            }
        }

        fn endless(bytes: &[u8]) -> Self {
            Self {
                endless: Some(bytes.to_vec()),
                ..Self::default()
            }
        }
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let chunk = match self.reads.pop_front() {
                Some(read) => read?,
                None => match &self.endless {
                    Some(bytes) => bytes.clone(),
                    None => return Ok(0),
                },
            };
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn timeout() -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
    }

    fn chunk(bytes: &[u8]) -> io::Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    // --- Sending ---

    #[test]
    fn send_writes_exact_frames() {
        let mut lamp = Lamp::new(FakePort::default());
        lamp.set_color(Rgb::new(255, 70, 20)).unwrap();
        let frame = lamp.set_level(220).unwrap();
        assert_eq!(frame.as_bytes(), &[1, 220]);

        let port = lamp.into_inner();
        assert_eq!(port.written, vec![0, 255, 70, 20, 1, 220]);
        assert_eq!(port.flushes, 2);
    }

    // --- Reading ---

    #[test]
    fn lines_lose_their_endings() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![chunk(b"level ok\r\ncolor ok\n")]));
        assert_eq!(lamp.next_line().unwrap().as_deref(), Some("level ok"));
        assert_eq!(lamp.next_line().unwrap().as_deref(), Some("color ok"));
    }

    #[test]
    fn partial_line_survives_timeout() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![chunk(b"hel"), timeout(), chunk(b"lo\n")]));
        assert_eq!(lamp.next_line().unwrap(), None);
        assert_eq!(lamp.next_line().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn invalid_utf8_is_printed_lossily() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![chunk(b"\xffok\n")]));
        assert_eq!(lamp.next_line().unwrap().as_deref(), Some("\u{fffd}ok"));
    }

    #[test]
    fn end_of_stream_is_a_disconnect() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![chunk(b"bye\n")]));
        assert_eq!(lamp.next_line().unwrap().as_deref(), Some("bye"));
        assert!(matches!(lamp.next_line(), Err(LinkError::Disconnected)));
    }

    #[test]
    fn unterminated_tail_is_returned_before_disconnect() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![chunk(b"no new"), timeout(), chunk(b"line")]));
        assert_eq!(lamp.next_line().unwrap(), None);
        assert_eq!(lamp.next_line().unwrap().as_deref(), Some("no newline"));
        assert!(matches!(lamp.next_line(), Err(LinkError::Disconnected)));
    }

    #[test]
    fn overlong_line_is_split() {
        let mut lamp = Lamp::new(FakePort::endless(&[b'a'; READ_CHUNK]));
        let line = lamp.next_line().unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_LEN);
        assert!(line.bytes().all(|b| b == b'a'));
        assert!(lamp.pending.len() < MAX_LINE_LEN);
    }

    #[test]
    fn other_read_errors_propagate() {
        let broken = Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        let mut lamp = Lamp::new(FakePort::with_reads(vec![broken]));
        assert!(matches!(lamp.next_line(), Err(LinkError::Io(ref e)) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn drain_stops_at_first_timeout() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![
            chunk(b"a\nb\n"),
            chunk(b"c\n"),
            timeout(),
            chunk(b"d\n"),
        ]));
        assert_eq!(lamp.drain().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(lamp.drain().unwrap(), vec!["d"]);
        assert!(matches!(lamp.drain(), Err(LinkError::Disconnected)));
    }

    #[test]
    fn drain_keeps_lines_received_before_disconnect() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![chunk(b"level ok\nbye\n")]));
        assert_eq!(lamp.drain().unwrap(), vec!["level ok", "bye"]);
        assert!(matches!(lamp.drain(), Err(LinkError::Disconnected)));
    }

    #[test]
    fn drain_keeps_lines_received_before_read_error() {
        let broken = Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        let mut lamp = Lamp::new(FakePort::with_reads(vec![chunk(b"color ok\n"), broken]));
        assert_eq!(lamp.drain().unwrap(), vec!["color ok"]);
        assert!(matches!(lamp.drain(), Err(LinkError::Io(ref e)) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn drain_returns_when_device_never_pauses() {
        let mut lamp = Lamp::new(FakePort::endless(b"x\n"));
        assert_eq!(lamp.drain().unwrap().len(), DRAIN_LIMIT);
        assert_eq!(lamp.drain().unwrap().len(), DRAIN_LIMIT);
    }

    #[test]
    fn monitor_honours_line_limit() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![
            timeout(),
            chunk(b"one\ntwo\n"),
            timeout(),
            chunk(b"three\nfour\n"),
        ]));
        let mut seen = Vec::new();
        let count = lamp.monitor(Some(3), |line| seen.push(line.to_string())).unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen, vec!["one", "two", "three"]);
    }

    #[test]
    fn unbounded_monitor_ends_on_disconnect() {
        let mut lamp = Lamp::new(FakePort::with_reads(vec![chunk(b"x\n")]));
        let mut seen = 0;
        let result = lamp.monitor(None, |_| seen += 1);
        assert!(matches!(result, Err(LinkError::Disconnected)));
        assert_eq!(seen, 1);
    }

    // --- Opening ---

    #[test]
    fn opening_missing_device_fails_fast() {
        let config = PortConfig::new("/dev/lamp-ctl-no-such-device", 115_200);
        match Lamp::open(&config) {
            Err(LinkError::Open { path, .. }) => assert_eq!(path, "/dev/lamp-ctl-no-such-device"),
            Err(other) => panic!("expected an open error, got {other:?}"),
            Ok(_) => panic!("opening a missing device succeeded"),
        }
    }
}
