//! Ports Module
//!
//! Abstract seams to the host platform: key-value persistence, time,
//! backend transport and network reachability. Each port ships with the
//! adapters the daemon wires in, plus in-memory variants for tests.

mod clock;
mod network;
mod storage;
mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use network::{NetworkProbe, TcpProbe};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use transport::{HttpTransport, Transport};
