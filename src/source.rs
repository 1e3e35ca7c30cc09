//! Event intake: the seam between the external kernel event source and the
//! aggregation core.
//!
//! Probe installation and attachment live outside this crate; whatever
//! mechanism observes the kernel only has to emit the wire form of
//! [`KernelEvent`], one JSON object per line.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::event::KernelEvent;
use crate::tracker::Aggregator;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event source already started")]
    AlreadyStarted,
    #[error("failed to read event stream: {0}")]
    Read(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// An external producer of kernel events.
///
/// Implementations deliver events by calling [`Aggregator::handle_event`]
/// from however many execution contexts they own; the aggregator needs no
/// external synchronization.
pub trait EventSource {
    /// Begins delivering events to `aggregator`. Returns once delivery has
    /// been set up; delivery itself proceeds in the background.
    fn start(&mut self, aggregator: Arc<Aggregator>) -> Result<()>;
}

/// Reads newline-delimited JSON events from an async reader.
///
/// Malformed lines are logged and skipped rather than aborting the stream;
/// the stream ending is normal termination.
#[derive(Debug)]
pub struct JsonLineSource<R> {
    reader: Option<R>,
    join_handles: Vec<tokio::task::JoinHandle<Result<()>>>,
}

impl JsonLineSource<BufReader<tokio::io::Stdin>> {
    /// An event source consuming the process's standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> JsonLineSource<R>
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            join_handles: Vec::default(),
        }
    }

    /// Waits for the intake task to drain its stream.
    pub async fn join_all(&mut self) -> Result<()> {
        for handle in self.join_handles.drain(..) {
            handle.await.expect("event intake task panicked")?;
        }

        Ok(())
    }
}

impl<R> EventSource for JsonLineSource<R>
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    fn start(&mut self, aggregator: Arc<Aggregator>) -> Result<()> {
        let reader = self.reader.take().ok_or(Error::AlreadyStarted)?;
        self.join_handles
            .push(tokio::spawn(intake_task(reader, aggregator)));

        Ok(())
    }
}

async fn intake_task<R>(reader: R, aggregator: Arc<Aggregator>) -> Result<()>
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.map_err(Error::Read)? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<KernelEvent>(line) {
            Ok(event) => aggregator.handle_event(&event),
            Err(err) => {
                log::warn!(target: "event intake", "skipping malformed event line: {err}");
            }
        }
    }
    log::debug!(target: "event intake", "event stream ended");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CounterStore;

    fn source_from(data: &str) -> JsonLineSource<BufReader<std::io::Cursor<Vec<u8>>>> {
        JsonLineSource::new(BufReader::new(std::io::Cursor::new(data.as_bytes().to_vec())))
    }

    #[tokio::test]
    async fn test_intake_delivers_events() {
        let aggregator = Arc::new(Aggregator::new(Arc::new(CounterStore::new())));
        let mut source = source_from(
            "{\"type\":\"switch_in\",\"pid\":42,\"ts\":0}\n\
             {\"type\":\"packet_received\",\"pid\":42,\"len\":1500}\n\
             {\"type\":\"switch_out\",\"pid\":42,\"ts\":50}\n",
        );

        source.start(Arc::clone(&aggregator)).unwrap();
        source.join_all().await.unwrap();

        let snap = aggregator.store().get(42).unwrap();
        assert_eq!(snap.cpu_time_ns, 50);
        assert_eq!(snap.bytes_received, 1500);
    }

    #[tokio::test]
    async fn test_intake_skips_malformed_lines() {
        let aggregator = Arc::new(Aggregator::new(Arc::new(CounterStore::new())));
        let mut source = source_from(
            "not json at all\n\
             \n\
             {\"type\":\"no_such_event\",\"pid\":1}\n\
             {\"type\":\"socket_state_changed\",\"pid\":7}\n",
        );

        source.start(Arc::clone(&aggregator)).unwrap();
        source.join_all().await.unwrap();

        assert_eq!(aggregator.store().len(), 1);
        assert!(aggregator.store().get(7).is_some());
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let aggregator = Arc::new(Aggregator::new(Arc::new(CounterStore::new())));
        let mut source = source_from("");

        source.start(Arc::clone(&aggregator)).unwrap();
        assert!(matches!(
            source.start(aggregator),
            Err(Error::AlreadyStarted)
        ));
    }
}
