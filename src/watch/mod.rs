//! Watch registry and reconnect loops
//!
//! ```text
//! KvWatchClient::watch(path)
//!   ├─> WatchRegistry::register()     [fails with AlreadyWatching]
//!   └─> ReconnectLoop::spawn()        [1 task per path]
//!         loop {
//!           blocking_list(path, index) ──ok──> WatchEntry::apply() ──> handler
//!                                     └─err─> sleep(retry_delay)
//!         }
//!
//! KvWatchClient::stop_watch(path)
//!   ├─> WatchRegistry::unregister()   [path free for reuse]
//!   ├─> WatchEntry::request_stop()    [Running -> StopRequested]
//!   └─> WatchEntry::wait_stopped()    [returns once loop reports Stopped]
//! ```
//!
//! Handlers of one path run sequentially on that path's loop task. A handler
//! must not block on `stop_watch` for its own path: it would wait on itself.
//! Nor may it block on `watch` or `reset`: `reset` holds the lifecycle lock
//! while waiting for every loop, including the handler's own. Spawn such
//! calls from the handler instead.

mod entry;
mod reconnect;
mod registry;
mod stream;

pub use entry::*;
pub(crate) use reconnect::*;
pub use registry::*;
pub use stream::*;
