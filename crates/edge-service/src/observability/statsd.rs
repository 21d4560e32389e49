//! Fire-and-forget statsd client.
//!
//! Emits DogStatsD lines (`name:value|type|#tag:value,...`) over a connected,
//! non-blocking UDP socket. A send that would block or fails is dropped and
//! logged at debug; it never delays a response.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

pub struct StatsdClient {
    socket: UdpSocket,
    prefix: String,
}

impl StatsdClient {
    /// Connect to a statsd agent.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the host does not resolve or the socket cannot
    /// be bound or connected.
    pub fn connect(host: &str, port: u16, prefix: &str) -> io::Result<Self> {
        let target = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("statsd host '{host}' did not resolve"),
            )
        })?;

        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local)?;
        socket.connect(target)?;
        socket.set_nonblocking(true)?;

        tracing::info!(target: "edge.statsd", agent = %target, prefix = %prefix, "Statsd client connected");

        Ok(Self {
            socket,
            prefix: prefix.to_string(),
        })
    }

    /// Increment a counter by one.
    pub fn incr(&self, name: &str, tags: &[(&str, &str)]) {
        self.send(&self.line(name, "1", "c", tags));
    }

    /// Record a timing in milliseconds.
    pub fn timing(&self, name: &str, millis: u64, tags: &[(&str, &str)]) {
        self.send(&self.line(name, &millis.to_string(), "ms", tags));
    }

    fn line(&self, name: &str, value: &str, kind: &str, tags: &[(&str, &str)]) -> String {
        let mut line = format!("{}{}:{}|{}", self.prefix, name, value, kind);
        if !tags.is_empty() {
            let tags: Vec<String> = tags
                .iter()
                .map(|(k, v)| format!("{k}:{}", sanitize_tag_value(v)))
                .collect();
            line.push_str("|#");
            line.push_str(&tags.join(","));
        }
        line
    }

    fn send(&self, line: &str) {
        if let Err(e) = self.socket.send(line.as_bytes()) {
            tracing::debug!(target: "edge.statsd", error = %e, "Dropped statsd packet");
        }
    }
}

/// Tag values may carry request data; characters that delimit fields, tags
/// or datagrams are replaced with `_`.
fn sanitize_tag_value(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '|' | ',' | '#' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
