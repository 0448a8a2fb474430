//! Server-side networking: length-prefixed framing, versioned JSON messages,
//! connection sessions, and the authoritative TCP server that validates
//! every update before broadcasting it.

pub mod canonical;
pub mod framing;
pub mod messages;
pub mod server;
pub mod session;
pub mod spawn;

pub use canonical::{AcceptOutcome, CanonicalStore};
pub use framing::{FrameError, FrameLimits, read_frame, write_frame};
pub use messages::{ClientMessage, MessageError, PROTOCOL_VERSION, ServerMessage, decode, encode};
pub use server::{
    CitadelServer, ConnectionId, ConnectionLimitReached, ConnectionMap, IdGenerator, ServerConfig,
    unix_millis,
};
pub use session::{Session, SessionError, SessionManager, SessionState, timeout_check};
pub use spawn::SpawnTable;
