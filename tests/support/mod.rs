//! Local echo peers for the integration tests.

#![allow(dead_code)]

use std::{
    io::{self, BufRead, Read},
    net::{TcpListener, TcpStream},
    process::exit,
    thread::{sleep, spawn, JoinHandle},
    time::Duration,
};

use tungstenite::{accept, Message, WebSocket};

pub type PeerSocket = WebSocket<TcpStream>;

/// Serve exactly one connection on a free local port with `handler`.
///
/// Returns the URI to connect to and the handle yielding the handler's result.
pub fn spawn_peer<F, T>(handler: F) -> (String, JoinHandle<T>)
where
    F: FnOnce(PeerSocket) -> T + Send + 'static,
    T: Send + 'static,
{
    env_logger::try_init().ok();

    spawn(|| {
        sleep(Duration::from_secs(10));
        println!("Test executed too long, perhaps stuck waiting for the peer...");
        exit(1);
    });

    let server = TcpListener::bind("127.0.0.1:0").expect("Can't listen on a local port");
    let port = server.local_addr().unwrap().port();

    let peer = spawn(move || {
        let stream = server.incoming().next().unwrap().unwrap();
        let socket = accept(stream).unwrap();
        handler(socket)
    });

    (format!("ws://127.0.0.1:{}", port), peer)
}

/// Echo every data message back until the client goes away.
pub fn echo(mut socket: PeerSocket) -> Vec<Message> {
    let mut received = Vec::new();
    loop {
        match socket.read() {
            Ok(message) if message.is_text() || message.is_binary() => {
                received.push(message.clone());
                socket.send(message).unwrap();
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    received
}

/// Echo the first message, then close the session.
///
/// The echo and the close frame go out in a single flush.
pub fn echo_once_then_close(mut socket: PeerSocket) -> Vec<Message> {
    let first = socket.read().unwrap();
    socket.write(first.clone()).unwrap();
    socket.close(None).unwrap();

    let mut received = vec![first];
    received.extend(drain(socket));
    received
}

/// Echo the first message, then close the session after `delay` in a separate flush.
pub fn echo_once_then_close_after(delay: Duration) -> impl FnOnce(PeerSocket) -> Vec<Message> {
    move |mut socket| {
        let first = socket.read().unwrap();
        socket.send(first.clone()).unwrap();
        sleep(delay);
        socket.close(None).unwrap();

        let mut received = vec![first];
        received.extend(drain(socket));
        received
    }
}

/// Answer the first message with several text frames in a single flush.
pub fn burst(replies: &'static [&'static str]) -> impl FnOnce(PeerSocket) -> Vec<Message> {
    move |mut socket| {
        let first = socket.read().unwrap();
        for reply in replies {
            socket.write(Message::Text((*reply).into())).unwrap();
        }
        socket.flush().unwrap();

        let mut received = vec![first];
        received.extend(drain(socket));
        received
    }
}

/// Close the session right away, before anything is echoed.
pub fn close_immediately(mut socket: PeerSocket) -> Vec<Message> {
    socket.close(None).unwrap();
    drain(socket)
}

/// Record data messages without answering until the client goes away.
pub fn record(socket: PeerSocket) -> Vec<Message> {
    drain(socket)
}

fn drain(mut socket: PeerSocket) -> Vec<Message> {
    let mut received = Vec::new();
    loop {
        match socket.read() {
            Ok(message) if message.is_text() || message.is_binary() => received.push(message),
            Ok(_) => {}
            Err(_) => break,
        }
    }
    received
}

/// Operator input that takes `delay` to type each line.
pub struct SlowInput<R> {
    inner: R,
    delay: Duration,
}

impl<R> SlowInput<R> {
    pub fn new(inner: R, delay: Duration) -> Self {
        SlowInput { inner, delay }
    }
}

impl<R: Read> Read for SlowInput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        sleep(self.delay);
        self.inner.read(buf)
    }
}

impl<R: BufRead> BufRead for SlowInput<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        sleep(self.delay);
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// A local URI nobody listens on.
pub fn unreachable_uri() -> String {
    let server = TcpListener::bind("127.0.0.1:0").expect("Can't listen on a local port");
    let port = server.local_addr().unwrap().port();
    drop(server);
    format!("ws://127.0.0.1:{}", port)
}
