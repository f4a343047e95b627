//! Polling change feed
//!
//! Lets clients notice that the catalog changed without refetching it:
//! each open stream recomputes a version token on a fixed interval and
//! pushes `update` when it moves.

pub mod sse;
pub mod stream;
pub mod version;

pub use stream::{FeedConfig, FeedHandle, FeedMessage};
pub use version::{Scope, SqliteVersionSource, VersionSource};

use thiserror::Error;

/// Change-feed failures
#[derive(Debug, Error)]
pub enum FeedError {
    /// A tick could not compute the version. Recoverable: reported to the
    /// client as an `error` event and the stream keeps polling.
    #[error("Version computation failed for {scope}: {source}")]
    VersionComputation {
        scope: String,
        #[source]
        source: lingo_common::Error,
    },

    /// The stream could not be opened. Fatal to that stream only.
    #[error("Change stream setup failed for {scope}: {source}")]
    ChannelSetup {
        scope: String,
        #[source]
        source: lingo_common::Error,
    },

    /// The channel closed before the stream started
    #[error("Change stream channel closed: {0}")]
    Closed(String),
}
