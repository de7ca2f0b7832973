//! Test doubles: in-memory and loopback SMTP peers, and a scripted [`MailProbe`].

use std::collections::{HashMap, VecDeque};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use super::{MailProbe, ProbeFailure, ProbeStage, SmtpOutcome, SmtpReply, TransportErrorKind};
use crate::validator::EmailAddress;

/// In-memory SMTP peer: replays `greeting`, then answers each command line
/// from `script` in order. Once the script runs out every read hits EOF, as
/// if the server hung up. Command lines are logged even after that.
pub(crate) struct ScriptedStream {
    outgoing: VecDeque<u8>,
    script: VecDeque<(&'static str, &'static str)>,
    partial: Vec<u8>,
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedStream {
    pub(crate) fn new(greeting: &[u8], script: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            outgoing: greeting.iter().copied().collect(),
            script: script.into(),
            partial: Vec::new(),
            log: Arc::default(),
        }
    }

    /// Command lines received so far; stays readable after the stream is gone.
    pub(crate) fn log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.log)
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.outgoing.len());
        for (slot, byte) in buf.iter_mut().zip(self.outgoing.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(pos) = self.partial.windows(2).position(|pair| pair == b"\r\n") {
            let raw: Vec<u8> = self.partial.drain(..pos + 2).collect();
            let line = String::from_utf8_lossy(&raw[..pos]).into_owned();
            if let Some((expected, response)) = self.script.pop_front() {
                assert!(
                    line.starts_with(expected),
                    "expected command starting with '{expected}', got '{line}'"
                );
                self.outgoing.extend(response.as_bytes());
            }
            self.log.lock().expect("lock").push(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A peer that never finishes its reply: every read yields `chunk` again,
/// after `delay`. Writes are swallowed.
pub(crate) struct EndlessReply {
    chunk: &'static [u8],
    delay: Duration,
}

impl EndlessReply {
    pub(crate) fn new(chunk: &'static [u8], delay: Duration) -> Self {
        Self { chunk, delay }
    }
}

impl Read for EndlessReply {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        let n = self.chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&self.chunk[..n]);
        Ok(n)
    }
}

impl Write for EndlessReply {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serves one connection: writes `greeting`, then for each `(expected, response)`
/// reads a command line starting with `expected` and writes `response`.
pub(crate) fn spawn_mock_server(
    greeting: &'static str,
    script: Vec<(&'static str, &'static str)>,
) -> (u16, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
    let port = listener.local_addr().expect("addr").port();
    let (ready_tx, ready_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        ready_tx.send(()).ok();
        let mut received = Vec::new();
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = handle_session(&mut stream, greeting, script, &mut received);
        }
        received
    });
    ready_rx.recv().expect("server ready");
    (port, handle)
}

fn handle_session(
    stream: &mut TcpStream,
    greeting: &str,
    script: Vec<(&'static str, &'static str)>,
    received: &mut Vec<String>,
) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    stream.write_all(greeting.as_bytes())?;
    stream.flush()?;
    for (expected, response) in script {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end().to_string();
        assert!(
            line.starts_with(expected),
            "expected command starting with '{expected}', got '{line}'"
        );
        received.push(line);
        stream.write_all(response.as_bytes())?;
        stream.flush()?;
    }
    Ok(())
}

/// Answers each host from a fixed table and records the order of calls.
/// Hosts missing from the table behave like a refused connection.
pub(crate) struct ScriptedProbe {
    outcomes: HashMap<String, SmtpOutcome>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub(crate) fn new(outcomes: Vec<(&str, SmtpOutcome)>) -> Self {
        Self {
            outcomes: outcomes
                .into_iter()
                .map(|(host, outcome)| (host.to_string(), outcome))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

impl MailProbe for ScriptedProbe {
    fn probe(&self, _email: &EmailAddress, host: &str) -> SmtpOutcome {
        self.calls.lock().expect("lock").push(host.to_string());
        self.outcomes
            .get(host)
            .cloned()
            .unwrap_or_else(|| refused(host))
    }
}

pub(crate) fn accepted() -> SmtpOutcome {
    SmtpOutcome::Accepted {
        reply: SmtpReply::new(250, "2.1.5 Ok"),
    }
}

pub(crate) fn rejected() -> SmtpOutcome {
    SmtpOutcome::Rejected {
        reply: SmtpReply::new(550, "5.1.1 User unknown"),
    }
}

pub(crate) fn greylisted(host: &str) -> SmtpOutcome {
    SmtpOutcome::Unavailable {
        reason: ProbeFailure::protocol(
            host,
            ProbeStage::RcptTo,
            SmtpReply::new(451, "4.7.1 Greylisted, try again later"),
        ),
    }
}

pub(crate) fn refused(host: &str) -> SmtpOutcome {
    SmtpOutcome::Unavailable {
        reason: ProbeFailure::Transport {
            host: host.to_string(),
            stage: ProbeStage::Connect,
            kind: TransportErrorKind::Refused,
            detail: "connection refused".to_string(),
        },
    }
}
