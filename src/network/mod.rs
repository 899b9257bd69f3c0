//! Network Layer
//!
//! Boundary collaborators around the decoder: the JSON envelope format, the
//! processing thread that owns the session, and the envelope sources that
//! feed it. Nothing here decodes game bytes.

pub mod connection;
pub mod envelope;
pub mod worker;

pub use connection::{pump_lines, run_relay, ConnectionConfig, ConnectionError};
pub use envelope::{Envelope, EnvelopeError};
pub use worker::{Inbound, Processor};
