//! Telemetry forwarder: one ASCII datagram per decoded trade.
//!
//! The wire format is plain text with no terminator:
//!
//! ```text
//! BUY,<quantity>,<price>     e.g. "BUY,1,100"
//! SELL,<quantity>,<price>    e.g. "SELL,32767,65535"
//! ```
//!
//! Sending is fire-and-forget. The socket is polled with `try_send`, so a
//! full send buffer surfaces as an error instead of stalling the loop; the
//! caller logs it and the datagram is gone.

use std::io::Write;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tracing::info;

use crate::error::{BridgeError, SendError};
use crate::types::{ForwardEndpoint, TradeRecord};

/// Longest possible payload: `"SELL,32767,65535"`.
pub const MAX_PAYLOAD_LEN: usize = 16;

/// Payload of the diagnostic self-test datagram.
pub const SELF_TEST_PAYLOAD: &[u8] = b"TEST,123,456";

/// A connected, non-blocking datagram socket.
pub trait DatagramSink {
    /// Send one datagram without blocking. Returns the bytes accepted.
    fn send_datagram(&self, payload: &[u8]) -> std::io::Result<usize>;
}

impl DatagramSink for UdpSocket {
    #[inline]
    fn send_datagram(&self, payload: &[u8]) -> std::io::Result<usize> {
        self.try_send(payload)
    }
}

/// Format `record` into `buf`, returning the number of bytes written.
pub fn format_payload(record: &TradeRecord, buf: &mut [u8; MAX_PAYLOAD_LEN]) -> Result<usize, SendError> {
    let mut cursor = std::io::Cursor::new(&mut buf[..]);
    write!(cursor, "{},{},{}", record.side.as_str(), record.quantity, record.price)
        .map_err(|_| SendError::Format)?;
    Ok(cursor.position() as usize)
}

/// Owns the telemetry socket and the fixed destination.
pub struct TelemetryForwarder<S = UdpSocket> {
    sink: S,
    endpoint: ForwardEndpoint,
}

impl TelemetryForwarder<UdpSocket> {
    /// Bind a UDP socket on `bind`, connect it to `endpoint` and wait until
    /// it is writable.
    ///
    /// Must run inside the tokio runtime whose reactor will keep driving the
    /// socket; that runtime has to outlive the forwarder.
    pub async fn connect(endpoint: ForwardEndpoint, bind: SocketAddr) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(bind)
            .await
            .map_err(|e| BridgeError::Udp(format!("bind {bind}: {e}")))?;
        socket
            .connect(endpoint.socket_addr())
            .await
            .map_err(|e| BridgeError::Udp(format!("connect {endpoint}: {e}")))?;
        socket.writable().await?;
        info!("telemetry socket ready, target {endpoint}");
        Ok(Self { sink: socket, endpoint })
    }
}

impl<S: DatagramSink> TelemetryForwarder<S> {
    /// Wrap an already-connected sink.
    pub fn with_sink(sink: S, endpoint: ForwardEndpoint) -> Self {
        Self { sink, endpoint }
    }

    pub fn endpoint(&self) -> ForwardEndpoint {
        self.endpoint
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Format `record` and send it as one datagram.
    pub fn forward(&self, record: &TradeRecord) -> Result<(), SendError> {
        let mut text = [0u8; MAX_PAYLOAD_LEN];
        let n = format_payload(record, &mut text)?;
        self.send_raw(&text[..n])
    }

    /// Send `payload` as one datagram through an exactly-sized buffer.
    ///
    /// An empty payload is a no-op.
    pub fn send_raw(&self, payload: &[u8]) -> Result<(), SendError> {
        let len = payload.len();
        if len == 0 {
            return Ok(());
        }

        let mut out = Vec::new();
        out.try_reserve_exact(len).map_err(|_| SendError::Alloc { len })?;
        out.extend_from_slice(payload);

        let sent = self.sink.send_datagram(&out)?;
        if sent != len {
            return Err(SendError::Short { sent, len });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::net::Ipv4Addr;

    use super::*;
    use crate::types::Side;

    #[derive(Default)]
    struct RecordingSink {
        sent: RefCell<Vec<Vec<u8>>>,
    }

    impl DatagramSink for RecordingSink {
        fn send_datagram(&self, payload: &[u8]) -> std::io::Result<usize> {
            self.sent.borrow_mut().push(payload.to_vec());
            Ok(payload.len())
        }
    }

    struct FailingSink(std::io::ErrorKind);

    impl DatagramSink for FailingSink {
        fn send_datagram(&self, _payload: &[u8]) -> std::io::Result<usize> {
            Err(self.0.into())
        }
    }

    struct TruncatingSink;

    impl DatagramSink for TruncatingSink {
        fn send_datagram(&self, payload: &[u8]) -> std::io::Result<usize> {
            Ok(payload.len() - 1)
        }
    }

    fn endpoint() -> ForwardEndpoint {
        ForwardEndpoint { address: Ipv4Addr::new(192, 168, 1, 50), port: 5001 }
    }

    #[test]
    fn payload_is_exact_ascii() {
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let rec = TradeRecord { side: Side::Buy, quantity: 1, price: 100 };
        let n = format_payload(&rec, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"BUY,1,100");
        assert_eq!(n, 9);
    }

    #[test]
    fn widest_payload_fits() {
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        let rec = TradeRecord { side: Side::Sell, quantity: 0x7FFF, price: u16::MAX };
        let n = format_payload(&rec, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"SELL,32767,65535");
        assert_eq!(n, MAX_PAYLOAD_LEN);
    }

    #[test]
    fn forward_sends_one_unterminated_datagram() {
        let fwd = TelemetryForwarder::with_sink(RecordingSink::default(), endpoint());
        fwd.forward(&TradeRecord { side: Side::Sell, quantity: 250, price: 4321 }).unwrap();

        let sent = fwd.sink().sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], b"SELL,250,4321");
        assert!(!sent[0].contains(&0));
    }

    #[test]
    fn empty_raw_payload_is_not_sent() {
        let fwd = TelemetryForwarder::with_sink(RecordingSink::default(), endpoint());
        fwd.send_raw(b"").unwrap();
        assert!(fwd.sink().sent.borrow().is_empty());
    }

    #[test]
    fn transmit_failure_is_reported() {
        let fwd = TelemetryForwarder::with_sink(FailingSink(std::io::ErrorKind::WouldBlock), endpoint());
        let err = fwd.forward(&TradeRecord { side: Side::Buy, quantity: 1, price: 1 }).unwrap_err();
        assert!(matches!(err, SendError::Transmit(ref e) if e.kind() == std::io::ErrorKind::WouldBlock));
    }

    #[test]
    fn short_send_is_reported() {
        let fwd = TelemetryForwarder::with_sink(TruncatingSink, endpoint());
        let err = fwd.send_raw(SELF_TEST_PAYLOAD).unwrap_err();
        assert!(matches!(err, SendError::Short { sent: 11, len: 12 }));
    }

    #[tokio::test]
    async fn loopback_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();
        let ep = ForwardEndpoint { address: Ipv4Addr::LOCALHOST, port };

        let fwd = TelemetryForwarder::connect(ep, "127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert_eq!(fwd.endpoint(), ep);
        fwd.forward(&TradeRecord { side: Side::Buy, quantity: 1, price: 100 }).unwrap();

        let mut buf = [0u8; 64];
        let n = tokio::time::timeout(std::time::Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"BUY,1,100");
    }
}
