//! Drives one run: connect, then either a single exchange or the interactive loop.

use std::io::{BufRead, Write};

use log::*;

use crate::{
    client::{is_closed, Connection, Reply},
    config::ClientConfig,
    encoding::Payload,
    error::{Error, Result},
    source::Source,
};

/// Line printed when the peer ends an interactive run.
pub const CLOSED_NOTICE: &str = "Connection closed";

/// One run of the client over one connection.
///
/// Prompts are read from `input`. Prompts, `Sent:` and `Received:` lines go to `output`.
#[derive(Debug)]
pub struct Session<R, W> {
    config: ClientConfig,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// Create a session. Nothing happens until [`Session::run`].
    pub fn new(config: ClientConfig, input: R, output: W) -> Self {
        Session { config, input, output }
    }

    /// Run to completion.
    ///
    /// A payload file is read and parsed before connecting, so a broken file never opens a
    /// connection. In the interactive loop a peer close ends the run normally; every other
    /// failure is returned as is.
    pub fn run(mut self) -> Result<()> {
        let payload = self.config.source.load(self.config.encoding)?;

        let mut connection = Connection::connect(&self.config.url)?;
        match payload {
            Some(payload) => self.exchange(&mut connection, &payload)?,
            None => {
                if !self.interact(&mut connection)? {
                    // The peer went first; finishing its handshake is best effort.
                    if let Err(err) = connection.close() {
                        debug!("Closing handshake incomplete: {}", err);
                    }
                    return Ok(());
                }
            }
        }
        connection.close()
    }

    /// Send one payload and, if configured, print one reply.
    fn exchange(&mut self, connection: &mut Connection, payload: &Payload) -> Result<()> {
        let body = self.config.encoding.encode(payload)?;
        connection.send(&body)?;
        match self.config.source {
            Source::File(_) => writeln!(self.output, "{} data sent", self.config.encoding.label())?,
            _ => writeln!(self.output, "Sent: {}", body)?,
        }

        if self.config.expect_reply {
            match connection.receive()? {
                Reply::Message(text) => self.print_reply(&text)?,
                Reply::Closed => return Err(Error::ConnectionClosed),
            }
        }
        Ok(())
    }

    /// Prompt, send, print the reply, repeat.
    ///
    /// Returns `false` if the peer closed the session, `true` if the input ran out and the
    /// connection is still ours to close.
    fn interact(&mut self, connection: &mut Connection) -> Result<bool> {
        let mut cycles = 0usize;
        loop {
            if connection.observe_closed()? {
                return self.closed_by_peer(cycles);
            }
            let Some(payload) = self.config.source.prompt(&mut self.input, &mut self.output)?
            else {
                debug!("No more input after {} message(s)", cycles);
                return Ok(true);
            };

            // The peer may have gone away while the operator was typing.
            if connection.observe_closed()? {
                return self.closed_by_peer(cycles);
            }

            let body = self.config.encoding.encode(&payload)?;
            match connection.send(&body) {
                Ok(()) => {}
                Err(Error::Transmission(ref err)) if is_closed(err) => {
                    return self.closed_by_peer(cycles);
                }
                Err(err) => return Err(err),
            }
            writeln!(self.output, "Sent: {}", body)?;

            match connection.receive()? {
                Reply::Message(text) => self.print_reply(&text)?,
                Reply::Closed => return self.closed_by_peer(cycles),
            }
            cycles += 1;
        }
    }

    fn closed_by_peer(&mut self, cycles: usize) -> Result<bool> {
        debug!("Peer closed the session after {} message(s)", cycles);
        writeln!(self.output, "{}", CLOSED_NOTICE)?;
        self.output.flush()?;
        Ok(false)
    }

    fn print_reply(&mut self, text: &str) -> Result<()> {
        let reply = self.config.encoding.decode(text)?;
        writeln!(self.output, "Received: {}", reply)?;
        self.output.flush()?;
        Ok(())
    }
}

/// Run `config` against the process standard streams.
pub fn run_stdio(config: ClientConfig) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    Session::new(config, stdin.lock(), stdout.lock()).run()
}
