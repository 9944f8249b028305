use std::io::Read;
use std::time::Duration;

use lumenrelay_frame::{DmxFrame, FixedFrameReader, ReadOutcome};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::sink::{DmxConnector, DmxSink};

/// How long to wait between attempts to reach the daemon.
///
/// The interval is constant and retries never give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub fn constant(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::constant(Self::DEFAULT_INTERVAL)
    }
}

/// Outcome of delivering one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the daemon.
    Sent,
    /// The daemon went away during the send; the frame is gone and the
    /// client handle was discarded.
    Lost,
}

/// Totals reported when the input stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    pub frames: u64,
    pub sent: u64,
    pub lost: u64,
    /// Bytes of an unfinished frame dropped at end of input.
    pub partial: usize,
}

/// Owns the daemon client handle for the DMX relay loop.
///
/// The handle is created on demand, blocking until the daemon answers, and
/// discarded whenever a send fails so the next frame reconnects.
pub struct DmxForwarder<C: DmxConnector> {
    connector: C,
    client: Option<C::Sink>,
    retry: RetryPolicy,
}

impl<C: DmxConnector> DmxForwarder<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            client: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether a client handle is currently held.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Deliver one frame, connecting first if needed.
    ///
    /// Blocks for as long as the daemon is unreachable. Errors other than an
    /// unavailable daemon are returned to the caller.
    pub fn deliver(&mut self, frame: &DmxFrame) -> Result<Delivery> {
        let client = match self.client.take() {
            Some(client) => client,
            None => self.connect_with_retry()?,
        };
        let client = self.client.insert(client);

        match client.send_dmx(frame.universe, &frame.payload) {
            Ok(()) => Ok(Delivery::Sent),
            Err(err) => {
                self.client = None;
                if err.is_daemon_unavailable() {
                    warn!(error = %err, "olad shut down, will reconnect on next frame");
                } else {
                    warn!(error = %err, "dmx send failed, will reconnect on next frame");
                }
                Ok(Delivery::Lost)
            }
        }
    }

    fn connect_with_retry(&mut self) -> Result<C::Sink> {
        let mut attempts = 0u64;
        loop {
            match self.connector.connect() {
                Ok(client) => {
                    if attempts > 0 {
                        info!(attempts, "olad is up");
                    }
                    return Ok(client);
                }
                Err(err) if err.is_daemon_unavailable() => {
                    if attempts == 0 {
                        info!(
                            retry_in = ?self.retry.interval,
                            "olad not running, waiting for it to start"
                        );
                    } else {
                        debug!(attempts, error = %err, "olad still unavailable");
                    }
                    attempts += 1;
                    std::thread::sleep(self.retry.interval);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Relay frames from `reader` until the input ends.
    ///
    /// Returns the totals at end of stream; the caller decides whether that
    /// is fatal. Read failures are returned as errors.
    pub fn run<R: Read>(&mut self, reader: &mut FixedFrameReader<R>) -> Result<ForwardSummary> {
        let mut summary = ForwardSummary::default();
        loop {
            match reader.read_frame()? {
                ReadOutcome::Frame(bytes) => {
                    let frame = DmxFrame::split(bytes)?;
                    summary.frames += 1;
                    match self.deliver(&frame)? {
                        Delivery::Sent => summary.sent += 1,
                        Delivery::Lost => summary.lost += 1,
                    }
                }
                ReadOutcome::EndOfStream { partial } => {
                    summary.partial = partial;
                    return Ok(summary);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;
    use std::time::Instant;

    use bytes::{Bytes, BytesMut};
    use lumenrelay_frame::{encode_dmx_frame, FrameConfig, UNIVERSE_SIZE};

    use super::*;
    use crate::error::OlaError;

    #[derive(Default)]
    struct DaemonState {
        refuse_connects: usize,
        connect_attempts: Vec<Instant>,
        fail_sends: usize,
        deliveries: Vec<(u8, Vec<u8>)>,
    }

    #[derive(Clone, Default)]
    struct FakeDaemon {
        state: Rc<RefCell<DaemonState>>,
    }

    struct FakeClient {
        state: Rc<RefCell<DaemonState>>,
    }

    impl DmxConnector for FakeDaemon {
        type Sink = FakeClient;

        fn connect(&mut self) -> crate::Result<FakeClient> {
            let mut state = self.state.borrow_mut();
            state.connect_attempts.push(Instant::now());
            if state.refuse_connects > 0 {
                state.refuse_connects -= 1;
                return Err(OlaError::unavailable("fake", "connection refused"));
            }
            Ok(FakeClient {
                state: Rc::clone(&self.state),
            })
        }
    }

    impl DmxSink for FakeClient {
        fn send_dmx(&mut self, universe: u8, payload: &[u8]) -> crate::Result<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_sends > 0 {
                state.fail_sends -= 1;
                return Err(OlaError::unavailable("fake", "broken pipe"));
            }
            state.deliveries.push((universe, payload.to_vec()));
            Ok(())
        }
    }

    struct BrokenConnector;

    impl DmxConnector for BrokenConnector {
        type Sink = FakeClient;

        fn connect(&mut self) -> crate::Result<FakeClient> {
            Err(OlaError::Io(std::io::Error::other("bad address")))
        }
    }

    fn dmx_frame(universe: u8, fill: u8) -> DmxFrame {
        DmxFrame {
            universe,
            payload: Bytes::from(vec![fill; UNIVERSE_SIZE]),
        }
    }

    fn wire(frames: &[(u8, u8)]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for &(universe, fill) in frames {
            encode_dmx_frame(universe, &[fill; UNIVERSE_SIZE], &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn waits_for_daemon_then_delivers() {
        let daemon = FakeDaemon::default();
        daemon.state.borrow_mut().refuse_connects = 3;
        let interval = Duration::from_millis(20);
        let mut forwarder = DmxForwarder::new(daemon.clone())
            .with_retry_policy(RetryPolicy::constant(interval));

        let delivery = forwarder.deliver(&dmx_frame(1, 0xaa)).unwrap();

        assert_eq!(delivery, Delivery::Sent);
        let state = daemon.state.borrow();
        assert_eq!(state.connect_attempts.len(), 4);
        for pair in state.connect_attempts.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
        assert_eq!(state.deliveries, vec![(1, vec![0xaa; UNIVERSE_SIZE])]);
    }

    #[test]
    fn connects_once_for_many_frames() {
        let daemon = FakeDaemon::default();
        let mut forwarder = DmxForwarder::new(daemon.clone());

        forwarder.deliver(&dmx_frame(0, 1)).unwrap();
        forwarder.deliver(&dmx_frame(0, 2)).unwrap();

        assert!(forwarder.is_connected());
        assert_eq!(daemon.state.borrow().connect_attempts.len(), 1);
    }

    #[test]
    fn failed_send_drops_handle_and_reconnects() {
        let daemon = FakeDaemon::default();
        let mut forwarder = DmxForwarder::new(daemon.clone())
            .with_retry_policy(RetryPolicy::constant(Duration::from_millis(1)));

        assert_eq!(forwarder.deliver(&dmx_frame(0, 1)).unwrap(), Delivery::Sent);

        daemon.state.borrow_mut().fail_sends = 1;
        assert_eq!(forwarder.deliver(&dmx_frame(0, 2)).unwrap(), Delivery::Lost);
        assert!(!forwarder.is_connected());

        assert_eq!(forwarder.deliver(&dmx_frame(0, 3)).unwrap(), Delivery::Sent);
        let state = daemon.state.borrow();
        assert_eq!(state.connect_attempts.len(), 2);
        let fills: Vec<u8> = state.deliveries.iter().map(|(_, p)| p[0]).collect();
        assert_eq!(fills, vec![1, 3]);
    }

    #[test]
    fn same_frame_twice_delivers_twice() {
        let daemon = FakeDaemon::default();
        let mut forwarder = DmxForwarder::new(daemon.clone());
        let input = wire(&[(5, 0x10), (5, 0x10)]);
        let mut reader = FixedFrameReader::new(Cursor::new(input), FrameConfig::dmx());

        let summary = forwarder.run(&mut reader).unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(summary.sent, 2);
        let state = daemon.state.borrow();
        assert_eq!(state.deliveries.len(), 2);
        assert_eq!(state.deliveries[0], state.deliveries[1]);
        assert_eq!(state.deliveries[0].0, 5);
    }

    #[test]
    fn run_reports_partial_tail() {
        let daemon = FakeDaemon::default();
        let mut forwarder = DmxForwarder::new(daemon.clone());
        let mut input = wire(&[(0, 1)]);
        input.extend_from_slice(&[7u8; 10]);
        let mut reader = FixedFrameReader::new(Cursor::new(input), FrameConfig::dmx());

        let summary = forwarder.run(&mut reader).unwrap();

        assert_eq!(summary.frames, 1);
        assert_eq!(summary.partial, 10);
        assert_eq!(daemon.state.borrow().deliveries.len(), 1);
    }

    #[test]
    fn run_survives_daemon_restart() {
        let daemon = FakeDaemon::default();
        daemon.state.borrow_mut().fail_sends = 1;
        let mut forwarder = DmxForwarder::new(daemon.clone())
            .with_retry_policy(RetryPolicy::constant(Duration::from_millis(1)));
        let input = wire(&[(0, 1), (0, 2), (0, 3)]);
        let mut reader = FixedFrameReader::new(Cursor::new(input), FrameConfig::dmx());

        let summary = forwarder.run(&mut reader).unwrap();

        assert_eq!(
            summary,
            ForwardSummary {
                frames: 3,
                sent: 2,
                lost: 1,
                partial: 0
            }
        );
    }

    #[test]
    fn unexpected_connect_error_is_returned() {
        let mut forwarder = DmxForwarder::new(BrokenConnector);
        let err = forwarder.deliver(&dmx_frame(0, 0)).unwrap_err();
        assert!(matches!(err, OlaError::Io(_)));
    }

    #[test]
    fn default_retry_interval_is_one_second() {
        assert_eq!(RetryPolicy::default().interval, Duration::from_secs(1));
    }
}
