//! Processing Thread
//!
//! One dedicated OS thread owns the [`LiveSession`]. Envelopes arrive over a
//! bounded mpsc queue from the I/O side; after each one the thread publishes
//! the session's events on a broadcast channel and the current snapshot on a
//! watch channel. Dropping every sender stops the thread.

use std::thread::JoinHandle;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::game::events::LiveEvent;
use crate::game::lifecycle::{LiveSession, SessionSnapshot};
use crate::network::envelope::Envelope;

/// Work item for the processing thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Envelope received from the console.
    Envelope(Envelope),
    /// The transport lost the connection.
    Disconnect,
}

/// Handle to the processing thread.
pub struct Processor {
    input: mpsc::Sender<Inbound>,
    events: broadcast::Sender<LiveEvent>,
    snapshot: watch::Receiver<SessionSnapshot>,
    thread: JoinHandle<()>,
}

impl Processor {
    /// Start the processing thread with exclusive ownership of `session`.
    pub fn spawn(
        session: LiveSession,
        queue_capacity: usize,
        event_capacity: usize,
    ) -> std::io::Result<Self> {
        let (input, input_rx) = mpsc::channel(queue_capacity.max(1));
        let (events, _) = broadcast::channel(event_capacity.max(1));
        let (snapshot_tx, snapshot) = watch::channel(session.snapshot());

        let thread_events = events.clone();
        let thread = std::thread::Builder::new()
            .name("slippi-processor".into())
            .spawn(move || run(session, input_rx, thread_events, snapshot_tx))?;

        Ok(Self {
            input,
            events,
            snapshot,
            thread,
        })
    }

    /// Queue for the I/O side.
    pub fn sender(&self) -> mpsc::Sender<Inbound> {
        self.input.clone()
    }

    /// Subscribe to live events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.events.subscribe()
    }

    /// Latest session snapshot.
    pub fn snapshot(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Close this handle's queue and wait for the thread to finish.
    ///
    /// Blocks until every other [`Processor::sender`] clone is dropped too.
    pub fn join(self) {
        let Self { input, thread, .. } = self;
        drop(input);
        if thread.join().is_err() {
            warn!("Processing thread panicked");
        }
    }
}

fn run(
    mut session: LiveSession,
    mut input: mpsc::Receiver<Inbound>,
    events: broadcast::Sender<LiveEvent>,
    snapshot: watch::Sender<SessionSnapshot>,
) {
    info!("Processing thread started");

    while let Some(item) = input.blocking_recv() {
        match item {
            Inbound::Envelope(envelope) => {
                if let Err(e) = session.handle(&envelope) {
                    warn!("Envelope {} rejected: {}", envelope.kind(), e);
                }
            }
            Inbound::Disconnect => {
                session.disconnect();
            }
        }

        for event in session.drain_events() {
            // No subscribers is fine.
            let _ = events.send(event);
        }
        snapshot.send_replace(session.snapshot());
    }

    debug!("Input queue closed");
    info!("Processing thread stopped");
}
