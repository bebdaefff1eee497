//! Push channel
//!
//! One live connection per active tenant. The channel reports its
//! connection state and the named events it receives as [`PushSignal`]s on a
//! broadcast channel; payloads are never interpreted.

mod channel;
mod transport;

pub use channel::{PushChannel, PushSignal};
pub use transport::{MemoryPushTransport, PushHub, PushStream, PushTransport, WsPushTransport};
