use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

use super::WatchHandler;
use crate::ValueCell;

/// Pull-based view of a watch
///
/// Yields the same cells a handler would receive. The channel is unbounded
/// because delivery happens synchronously on the loop task. Dropping the
/// stream does not stop the watch; call
/// [`stop_watch`](crate::KvWatchClient::stop_watch) for that. The stream ends
/// once the watch is stopped.
pub struct WatchStream {
    inner: UnboundedReceiverStream<ValueCell>,
}

impl WatchStream {
    pub(crate) fn channel() -> (WatchHandler, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: WatchHandler = std::sync::Arc::new(move |cell: ValueCell| {
            if tx.send(cell).is_err() {
                trace!("watch stream receiver dropped");
            }
        });

        (
            handler,
            Self {
                inner: UnboundedReceiverStream::new(rx),
            },
        )
    }
}

impl Stream for WatchStream {
    type Item = ValueCell;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
