//! Per-key resolution state machine.

use tokio::sync::broadcast;

/// Maximum refresh attempts after render-time load failures, per key.
pub const MAX_LOAD_RETRIES: u8 = 2;

/// State of one key's resolution.
///
/// Transition table:
///
/// ```text
/// (absent)            --resolve-->            Resolving
/// Resolving           --success-->            Resolved
/// Resolving           --failure-->            (absent)
/// Resolved (stale)    --resolve-->            Refreshing
/// Refreshing          --success/failure-->    Resolved
/// Resolved            --load failure-->       Retrying(1)
/// Retrying(n), n < 2  --load failure-->       Retrying(n + 1)
/// Retrying(2)         --load failure-->       GaveUp
/// ```
///
/// Waiters that find a `Resolving` or `Refreshing` entry subscribe to its
/// channel instead of issuing a second request; the retry bound is carried
/// in the state itself rather than in ad-hoc flags.
#[derive(Debug, Clone)]
pub enum ResolveState {
    /// First resolution in flight; waiters attach to the channel.
    Resolving(broadcast::Sender<Option<String>>),
    /// Resolved to a renderable URL.
    Resolved(String),
    /// Proactive refresh of a near-expiry URL in flight; `stale` keeps
    /// serving waiters that cannot wait.
    Refreshing {
        /// The near-expiry URL still usable until the refresh lands.
        stale: String,
        /// Channel the in-flight refresh completes on.
        tx: broadcast::Sender<Option<String>>,
    },
    /// Recovering from a render-time load failure.
    Retrying {
        /// Most recent URL handed to the caller.
        last: String,
        /// Refresh attempts consumed so far (at most [`MAX_LOAD_RETRIES`]).
        attempts: u8,
    },
    /// Retries exhausted; `last` stays rendered and no further requests
    /// are issued for this key.
    GaveUp(String),
}
