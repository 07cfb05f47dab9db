//! A single blocking client connection to an echo peer.

use std::{collections::VecDeque, fmt, io, net::TcpStream};

use log::*;
use tungstenite::{error::ProtocolError, stream::MaybeTlsStream, Message, WebSocket};
use url::Url;

use crate::error::{Error, Result, SerializationError, UrlError};

/// The socket type produced by [`tungstenite::connect`].
pub type ClientSocket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Outcome of [`Connection::receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// One text message from the peer.
    Message(String),
    /// The peer closed the session. The connection is not usable anymore.
    Closed,
}

/// Parse and check a websocket URI.
///
/// Only `ws://` and `wss://` with a host name are accepted. Whether `wss://` can actually
/// be used depends on the TLS feature the crate is built with.
pub fn parse_url(uri: &str) -> Result<Url> {
    let url = Url::parse(uri)?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(UrlError::UnsupportedUrlScheme(other.to_owned()).into()),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::NoHostName.into());
    }
    Ok(url)
}

/// One websocket session, owned by a single flow of control.
///
/// `Unconnected -> Connected -> Closed`: a value of this type only exists once the
/// handshake succeeded, and there is no way back from closed.
pub struct Connection {
    socket: ClientSocket,
    url: Url,
    /// Data messages read while looking for a close frame.
    pending: VecDeque<String>,
    /// The peer sent a close frame.
    closing: bool,
    /// The closing handshake finished or the transport is gone.
    closed: bool,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url.as_str())
            .field("pending", &self.pending.len())
            .field("closing", &self.closing)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Connection {
    /// Open a connection to `url`. A single attempt, never retried.
    pub fn connect(url: &Url) -> Result<Self> {
        debug!("Trying to contact {}...", url);
        let (socket, response) = tungstenite::connect(url.as_str()).map_err(Error::Connection)?;
        debug!("Connected to {} ({})", url, response.status());
        Ok(Connection {
            socket,
            url: url.clone(),
            pending: VecDeque::new(),
            closing: false,
            closed: false,
        })
    }

    /// The URL this connection was opened to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Number of data messages read ahead by [`Connection::observe_closed`] and not yet
    /// returned by [`Connection::receive`].
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Whether `send` and `receive` may still be used.
    pub fn is_open(&self) -> bool {
        !self.closing && !self.closed
    }

    /// Transmit `body` as one text message.
    pub fn send(&mut self, body: &str) -> Result<()> {
        if !self.is_open() {
            return Err(Error::Transmission(tungstenite::Error::AlreadyClosed));
        }
        trace!("Sending {} bytes to {}", body.len(), self.url);
        self.socket.send(Message::Text(body.to_owned().into())).map_err(Error::Transmission)
    }

    /// Block until the peer sends a data message or closes the session.
    ///
    /// Ping and pong frames are skipped. A peer close frame, a reset without closing
    /// handshake and a reset socket all end up as [`Reply::Closed`].
    pub fn receive(&mut self) -> Result<Reply> {
        if let Some(text) = self.pending.pop_front() {
            return Ok(Reply::Message(text));
        }
        if self.closed {
            return Ok(Reply::Closed);
        }
        loop {
            match self.socket.read() {
                Ok(message) => {
                    if let Some(text) = self.accept(message)? {
                        trace!("Received {} bytes from {}", text.len(), self.url);
                        return Ok(Reply::Message(text));
                    }
                }
                Err(err) if is_closed(&err) => {
                    debug!("Connection to {} closed: {}", self.url, err);
                    self.closed = true;
                    return Ok(Reply::Closed);
                }
                Err(err) => return Err(Error::Transmission(err)),
            }
        }
    }

    /// Check without blocking whether the peer has closed the session.
    ///
    /// Data messages that arrive in the meantime are kept for the next [`receive`].
    /// Over TLS the check only sees what the transport already reported.
    ///
    /// [`receive`]: Connection::receive
    pub fn observe_closed(&mut self) -> Result<bool> {
        if self.closing || self.closed {
            return Ok(true);
        }
        if !self.set_nonblocking(true)? {
            return Ok(false);
        }
        let drained = self.drain();
        self.set_nonblocking(false)?;
        drained?;
        Ok(self.closing || self.closed)
    }

    /// Close the session and wait for the peer to complete the closing handshake.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if !self.pending.is_empty() {
            warn!("Dropping {} unread message(s) from {}", self.pending.len(), self.url);
            self.pending.clear();
        }
        debug!("Closing connection to {}", self.url);
        if let Err(err) = self.socket.close(None) {
            if is_closed(&err) {
                self.closed = true;
                return Ok(());
            }
            return Err(Error::Transmission(err));
        }
        loop {
            match self.socket.read() {
                Ok(Message::Close(frame)) => trace!("Close acknowledged: {:?}", frame),
                Ok(message) => trace!("Ignoring {} byte message while closing", message.len()),
                Err(err) if is_closed(&err) => break,
                Err(err) => return Err(Error::Transmission(err)),
            }
        }
        self.closed = true;
        Ok(())
    }

    /// Read everything that is already available without blocking.
    fn drain(&mut self) -> Result<()> {
        loop {
            match self.socket.read() {
                Ok(message) => {
                    if let Some(text) = self.accept(message)? {
                        self.pending.push_back(text);
                    }
                }
                Err(tungstenite::Error::Io(ref err)) if err.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(());
                }
                Err(err) if is_closed(&err) => {
                    debug!("Connection to {} closed: {}", self.url, err);
                    self.closed = true;
                    return Ok(());
                }
                Err(err) => return Err(Error::Transmission(err)),
            }
        }
    }

    /// Turn an incoming message into reply text, or `None` for control frames.
    fn accept(&mut self, message: Message) -> Result<Option<String>> {
        match message {
            Message::Text(text) => Ok(Some(text.as_str().to_owned())),
            Message::Binary(data) => match String::from_utf8(data.to_vec()) {
                Ok(text) => Ok(Some(text)),
                Err(_) => Err(SerializationError::Utf8.into()),
            },
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
            Message::Close(frame) => {
                debug!("Peer {} is closing: {:?}", self.url, frame);
                self.closing = true;
                Ok(None)
            }
        }
    }

    /// Switch the underlying TCP stream; returns `false` if it cannot be reached.
    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<bool> {
        match tcp_stream(self.socket.get_ref()) {
            Some(stream) => {
                stream.set_nonblocking(nonblocking)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // No waiting here: the peer may never answer.
        if let Err(err) = self.socket.close(None) {
            trace!("Close on drop failed: {}", err);
        }
    }
}

fn tcp_stream(stream: &MaybeTlsStream<TcpStream>) -> Option<&TcpStream> {
    match stream {
        MaybeTlsStream::Plain(stream) => Some(stream),
        #[cfg(feature = "native-tls")]
        MaybeTlsStream::NativeTls(stream) => Some(stream.get_ref()),
        #[cfg(any(feature = "rustls-tls-native-roots", feature = "rustls-tls-webpki-roots"))]
        MaybeTlsStream::Rustls(stream) => Some(&stream.sock),
        _ => None,
    }
}

/// Errors that mean the peer is gone rather than that something went wrong.
pub(crate) fn is_closed(err: &tungstenite::Error) -> bool {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => true,
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
        tungstenite::Error::Io(err) => matches!(
            err.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}
