use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::{Thresholds, DEFAULT_BUFFER_SIZE};
use crate::error::{ProbeError, Result};
use crate::modules::creds::message::{self, LoginAttempt};

/// Outcome of feeding one round-trip into a [`LatencyTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencySample {
    /// Folded into the running average.
    Recorded,
    /// At or above the slow threshold; left out of the average.
    Slow,
}

/// Running round-trip estimate.
///
/// The first sample becomes the estimate. Afterwards each fast sample is
/// averaged with the current estimate at equal weight, so older samples decay
/// by half on every update. Slow samples are reported but never folded in.
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    average: Option<Duration>,
    slow_reply: Duration,
}

impl LatencyTracker {
    pub fn new(slow_reply: Duration) -> Self {
        Self {
            average: None,
            slow_reply,
        }
    }

    pub fn record(&mut self, round_trip: Duration) -> LatencySample {
        match self.average {
            None => {
                self.average = Some(round_trip);
                LatencySample::Recorded
            }
            Some(_) if round_trip >= self.slow_reply => LatencySample::Slow,
            Some(average) => {
                self.average = Some((average + round_trip) / 2);
                LatencySample::Recorded
            }
        }
    }

    pub fn average(&self) -> Option<Duration> {
        self.average
    }
}

/// What a receive produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Message(String),
    /// The connection was not open; nothing was read.
    Closed,
}

/// A single TCP session with the login service.
///
/// Requests and replies alternate strictly: one send, then one buffered read
/// of at most `buffer_size` bytes.
pub struct Connection {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
    buffer_size: usize,
    latency: LatencyTracker,
    backoff: Duration,
    sent_at: Option<Instant>,
    last_round_trip: Option<Duration>,
    backoffs: u64,
}

impl Connection {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let thresholds = Thresholds::default();
        Self {
            host: host.into(),
            port,
            stream: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            latency: LatencyTracker::new(thresholds.slow_reply()),
            backoff: thresholds.backoff(),
            sent_at: None,
            last_round_trip: None,
            backoffs: 0,
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_thresholds(mut self, thresholds: &Thresholds) -> Self {
        self.latency = LatencyTracker::new(thresholds.slow_reply());
        self.backoff = thresholds.backoff();
        self
    }

    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn average_latency(&self) -> Option<Duration> {
        self.latency.average()
    }

    pub fn last_round_trip(&self) -> Option<Duration> {
        self.last_round_trip
    }

    /// Number of slow replies that triggered the backoff pause.
    pub fn backoffs(&self) -> u64 {
        self.backoffs
    }

    pub async fn connect(&mut self) -> Result<()> {
        let addr = self.address();
        let stream = TcpStream::connect(&addr).await.map_err(|e| {
            error!("Failed to connect to {}: {}", addr, e);
            e
        })?;
        let _ = stream.set_nodelay(true);
        self.stream = Some(stream);
        info!("Connected to {}", addr);
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            // The peer may already be gone; closing is best effort.
            let _ = stream.shutdown().await;
        }
        self.sent_at = None;
        info!("Closed connection to {}", self.address());
        Ok(())
    }

    /// Encodes and writes one attempt. Returns `Ok(false)` without touching
    /// the socket when the connection is closed.
    pub async fn send(&mut self, attempt: &LoginAttempt) -> Result<bool> {
        let addr = self.address();
        let Some(stream) = self.stream.as_mut() else {
            error!(
                "Connection to {} found CLOSED while trying to send login '{}'",
                addr, attempt.login
            );
            return Ok(false);
        };

        let payload = message::encode(&attempt.login, &attempt.password)?;
        self.sent_at = Some(Instant::now());
        stream.write_all(payload.as_bytes()).await?;
        Ok(true)
    }

    /// Reads one reply and updates the latency estimate. A slow reply after
    /// the first one pauses for the backoff period before returning.
    pub async fn receive(&mut self) -> Result<Reply> {
        let addr = self.address();
        let Some(stream) = self.stream.as_mut() else {
            warn!("Tried to receive from a closed connection to {}", addr);
            return Ok(Reply::Closed);
        };

        let mut buf = vec![0u8; self.buffer_size];
        let n = stream.read(&mut buf).await?;
        let received_at = Instant::now();
        if n == 0 {
            self.stream = None;
            return Err(ProbeError::Disconnected { addr });
        }
        buf.truncate(n);
        let text = String::from_utf8(buf)?;

        if let Some(sent_at) = self.sent_at.take() {
            let round_trip = received_at.duration_since(sent_at);
            self.last_round_trip = Some(round_trip);
            if self.latency.record(round_trip) == LatencySample::Slow {
                self.backoffs += 1;
                debug!(
                    "Slow reply from {} ({:.3}s), backing off for {:.1}s",
                    addr,
                    round_trip.as_secs_f64(),
                    self.backoff.as_secs_f64()
                );
                sleep(self.backoff).await;
            }
        }

        Ok(Reply::Message(text))
    }

    /// Sends one attempt and returns the decoded `result` text.
    pub async fn exchange(&mut self, attempt: &LoginAttempt) -> Result<String> {
        if !self.send(attempt).await? {
            return Err(ProbeError::closed(self.address()));
        }
        match self.receive().await? {
            Reply::Message(text) => message::decode(&text),
            Reply::Closed => Err(ProbeError::closed(self.address())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn first_sample_sets_estimate() {
        let mut tracker = LatencyTracker::new(Duration::from_millis(100));
        assert_eq!(tracker.average(), None);
        assert_eq!(tracker.record(Duration::from_millis(40)), LatencySample::Recorded);
        assert_eq!(tracker.average(), Some(Duration::from_millis(40)));
    }

    #[test]
    fn first_sample_is_kept_even_when_slow() {
        let mut tracker = LatencyTracker::new(Duration::from_millis(100));
        assert_eq!(tracker.record(Duration::from_millis(500)), LatencySample::Recorded);
        assert_eq!(tracker.average(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn fast_samples_average_with_equal_weight() {
        let mut tracker = LatencyTracker::new(Duration::from_millis(100));
        tracker.record(Duration::from_millis(20));
        tracker.record(Duration::from_millis(40));
        assert_eq!(tracker.average(), Some(Duration::from_millis(30)));
        tracker.record(Duration::from_millis(10));
        assert_eq!(tracker.average(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn slow_sample_is_not_folded_in() {
        let mut tracker = LatencyTracker::new(Duration::from_millis(100));
        tracker.record(Duration::from_millis(20));
        assert_eq!(tracker.record(Duration::from_millis(100)), LatencySample::Slow);
        assert_eq!(tracker.record(Duration::from_secs(2)), LatencySample::Slow);
        assert_eq!(tracker.average(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn address_brackets_ipv6() {
        assert_eq!(Connection::new("127.0.0.1", 9090).address(), "127.0.0.1:9090");
        assert_eq!(Connection::new("::1", 9090).address(), "[::1]:9090");
    }

    #[tokio::test]
    async fn closed_connection_reports_instead_of_failing() {
        let mut conn = Connection::new("127.0.0.1", 1);
        assert!(!conn.is_open());
        assert!(!conn.send(&LoginAttempt::login_only("admin")).await.unwrap());
        assert_eq!(conn.receive().await.unwrap(), Reply::Closed);
        assert!(matches!(
            conn.exchange(&LoginAttempt::login_only("admin")).await,
            Err(ProbeError::ConnectionClosed { .. })
        ));
    }

    #[tokio::test]
    async fn receive_tracks_round_trips() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                socket.write_all(br#"{"result": "Wrong login!"}"#).await.unwrap();
            }
        });

        let mut conn = Connection::new("127.0.0.1", port);
        conn.connect().await.unwrap();
        assert!(conn.is_open());

        let attempt = LoginAttempt::login_only("admin");
        assert_eq!(conn.exchange(&attempt).await.unwrap(), "Wrong login!");
        let first = conn.last_round_trip().unwrap();
        assert_eq!(conn.average_latency(), Some(first));

        assert_eq!(conn.exchange(&attempt).await.unwrap(), "Wrong login!");
        let second = conn.last_round_trip().unwrap();
        assert!(second < Duration::from_millis(100));
        assert_eq!(conn.average_latency(), Some((first + second) / 2));
        assert_eq!(conn.backoffs(), 0);

        conn.disconnect().await.unwrap();
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn slow_reply_pauses_and_keeps_average() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let mut replies = 0;
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                replies += 1;
                if replies == 2 {
                    sleep(Duration::from_millis(150)).await;
                }
                socket.write_all(br#"{"result": "Wrong login!"}"#).await.unwrap();
            }
        });

        let mut conn = Connection::new("127.0.0.1", port);
        conn.connect().await.unwrap();
        let attempt = LoginAttempt::login_only("admin");

        conn.exchange(&attempt).await.unwrap();
        let estimate = conn.average_latency();
        assert!(estimate.is_some());

        let started = Instant::now();
        assert_eq!(conn.exchange(&attempt).await.unwrap(), "Wrong login!");
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(conn.last_round_trip().unwrap() >= Duration::from_millis(100));
        assert_eq!(conn.backoffs(), 1);
        assert_eq!(conn.average_latency(), estimate);
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut conn = Connection::new("127.0.0.1", port);
        assert!(matches!(conn.connect().await, Err(ProbeError::Io(_))));
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn peer_hangup_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 1024];
            let _ = socket.read(&mut buf).await;
        });

        let mut conn = Connection::new("127.0.0.1", port);
        conn.connect().await.unwrap();
        let result = conn.exchange(&LoginAttempt::login_only("admin")).await;
        assert!(matches!(result, Err(ProbeError::Disconnected { .. })));
        assert!(!conn.is_open());
    }
}
