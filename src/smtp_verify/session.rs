use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tracing::debug;

use super::types::{ProbeFailure, ProbeStage, SmtpReply};

/// Longest reply line accepted, CRLF included.
const MAX_LINE_LEN: usize = 8192;
/// Most lines accepted in one multi-line reply.
const MAX_REPLY_LINES: usize = 128;

/// One plain-text SMTP connection. A whole reply must arrive within the
/// session timeout; on TCP each socket read is bounded by it as well.
pub(crate) struct SmtpSession<S = TcpStream> {
    host: String,
    timeout: Duration,
    reader: BufReader<S>,
}

impl SmtpSession<TcpStream> {
    /// Resolves `host:port` and tries each address in turn.
    pub(crate) fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, ProbeFailure> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|err| ProbeFailure::host_resolution(host, err.to_string()))?
            .collect();
        if addrs.is_empty() {
            return Err(ProbeFailure::host_resolution(host, "no addresses found"));
        }

        let mut last_err = None;
        for addr in &addrs {
            debug!(host, %addr, "connecting");
            match TcpStream::connect_timeout(addr, timeout) {
                Ok(stream) => {
                    return Self::from_tcp(host, stream, timeout)
                        .map_err(|err| ProbeFailure::transport(host, ProbeStage::Connect, &err));
                }
                Err(err) => {
                    debug!(host, %addr, error = %err, "connect failed");
                    last_err = Some(err);
                }
            }
        }
        let err = last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no socket address available",
            )
        });
        Err(ProbeFailure::transport(host, ProbeStage::Connect, &err))
    }

    fn from_tcp(host: &str, stream: TcpStream, timeout: Duration) -> io::Result<Self> {
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(Self::new(host, stream, timeout))
    }
}

impl<S: Read + Write> SmtpSession<S> {
    /// Wraps an already connected transport.
    pub(crate) fn new(host: &str, stream: S, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            timeout,
            reader: BufReader::new(stream),
        }
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn read_reply(&mut self, stage: ProbeStage) -> Result<SmtpReply, ProbeFailure> {
        let reply = self
            .read_reply_raw()
            .map_err(|err| ProbeFailure::transport(&self.host, stage, &err))?;
        debug!(host = %self.host, %stage, code = reply.code, "S: {}", reply);
        Ok(reply)
    }

    /// Sends one command line and reads its reply.
    pub(crate) fn command(
        &mut self,
        command: &str,
        stage: ProbeStage,
    ) -> Result<SmtpReply, ProbeFailure> {
        debug!(host = %self.host, %stage, "C: {command}");
        self.send_line(command)
            .map_err(|err| ProbeFailure::transport(&self.host, stage, &err))?;
        self.read_reply(stage)
    }

    /// Sends `QUIT` and waits for the server's goodbye.
    pub(crate) fn quit(mut self) -> io::Result<SmtpReply> {
        self.send_line("QUIT")?;
        self.read_reply_raw()
    }

    fn send_line(&mut self, command: &str) -> io::Result<()> {
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        let stream = self.reader.get_mut();
        stream.write_all(&line)?;
        stream.flush()
    }

    fn read_reply_raw(&mut self) -> io::Result<SmtpReply> {
        let deadline = Instant::now() + self.timeout;
        let mut code = None;
        let mut message_lines = Vec::new();
        loop {
            if message_lines.len() == MAX_REPLY_LINES {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("SMTP reply has more than {MAX_REPLY_LINES} lines"),
                ));
            }
            let mut raw = self.read_line(deadline)?;
            if raw.ends_with(b"\n") {
                raw.pop();
                if raw.ends_with(b"\r") {
                    raw.pop();
                }
            }

            let parsed_code = parse_code(&raw).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid SMTP reply: '{}'", String::from_utf8_lossy(&raw)),
                )
            })?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("inconsistent SMTP reply codes: {existing} vs {parsed_code}"),
                    ));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }

            let continuation = raw.get(3).copied() == Some(b'-');
            let text = raw.get(4..).unwrap_or_default();
            message_lines.push(String::from_utf8_lossy(text).into_owned());
            if !continuation {
                break;
            }
        }
        let code = code.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "SMTP reply missing status code")
        })?;
        Ok(SmtpReply::new(code, message_lines.join("\n")))
    }

    /// One raw line, newline included. Fails once `deadline` passes or the
    /// line outgrows [`MAX_LINE_LEN`].
    fn read_line(&mut self, deadline: Instant) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            if Instant::now() >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no complete SMTP reply within {:?}", self.timeout),
                ));
            }
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed while reading reply",
                ));
            }
            let (taken, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            };
            line.extend_from_slice(&available[..taken]);
            self.reader.consume(taken);
            if line.len() > MAX_LINE_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("SMTP reply line longer than {MAX_LINE_LEN} bytes"),
                ));
            }
            if complete {
                return Ok(line);
            }
        }
    }
}

/// The leading three-digit status code, read from raw bytes.
fn parse_code(line: &[u8]) -> Option<u16> {
    let digits = line.get(..3)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(
        digits
            .iter()
            .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0')),
    )
}
