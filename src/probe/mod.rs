//! Stream liveness probing.
//!
//! The [`Probe`] launches an external decode tool (ffmpeg by default)
//! against the local relay URL and drives three concurrent activities until
//! the first of them terminates the run: waiting for process exit, tailing
//! the diagnostic channel (classified line by line, kept in a bounded ring
//! buffer for failure reports), and decoding the primary output as an FLV
//! container to prove the stream carries media.

mod classify;
mod flv;
mod player;
mod tail;

pub use classify::{classify, SilenceEvent};
pub use flv::{FlvError, FlvHeader, FlvTag};
pub use player::Probe;
pub use tail::LogTail;
