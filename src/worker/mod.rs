mod pass;

pub use pass::{AnnotatedRow, PartialTally, WorkerPass};

use crate::classify::ClassifierHandle;
use crate::cluster::{Assignment, Message};
use crate::{Error, Result};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Run the pass an assignment asks for. The plain scan is CPU-bound and goes
/// to the blocking pool; the classified scan awaits the classifier per record.
pub async fn execute(assignment: &Assignment, classifier: &ClassifierHandle) -> Result<PartialTally> {
    let pass = WorkerPass::new(assignment.columns).keeping_rows(assignment.keep_rows);
    if assignment.classify {
        return Ok(pass.run_classified(&assignment.chunk, classifier).await);
    }
    let chunk = assignment.chunk.clone();
    let tally = tokio::task::spawn_blocking(move || pass.run(&chunk)).await?;
    Ok(tally)
}

/// Worker side of the protocol, independent of transport: take one
/// assignment, answer with one `Partial` (or `Failed`), and stop early if the
/// coordinator aborts or goes away while the pass is running.
pub async fn serve<I, O>(mut inbox: I, mut outbox: O, classifier: ClassifierHandle) -> Result<()>
where
    I: Stream<Item = Result<Message>> + Unpin,
    O: Sink<Message, Error = Error> + Unpin,
{
    let assignment = match inbox.next().await {
        Some(Ok(Message::Assign(assignment))) => assignment,
        Some(Ok(Message::Abort)) | None => {
            debug!("released before receiving an assignment");
            return Ok(());
        }
        Some(Ok(other)) => {
            return Err(Error::General(format!(
                "expected an assignment, got {}",
                other.kind()
            )));
        }
        Some(Err(e)) => return Err(e),
    };

    let worker = assignment.worker;
    info!(%worker, bytes = assignment.chunk.len(), classify = assignment.classify, "range assigned");
    let started = Instant::now();

    let reply = tokio::select! {
        outcome = execute(&assignment, &classifier) => match outcome {
            Ok(tally) => {
                info!(
                    %worker,
                    records = tally.records,
                    skipped = tally.skipped,
                    words = tally.words.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "range done"
                );
                Message::Partial { worker, tally }
            }
            Err(e) => {
                error!(%worker, error = %e, "pass failed");
                Message::Failed { worker, reason: e.to_string() }
            }
        },
        message = inbox.next() => match message {
            Some(Ok(Message::Abort)) => {
                warn!(%worker, "aborted by coordinator");
                return Ok(());
            }
            None => {
                warn!(%worker, "coordinator went away");
                return Ok(());
            }
            Some(Ok(other)) => {
                return Err(Error::UnexpectedMessage { worker, kind: other.kind() });
            }
            Some(Err(e)) => {
                error!(%worker, error = %e, "inbox failed while running");
                return Err(e);
            }
        }
    };

    outbox.send(reply).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::cluster::WorkerId;
    use crate::corpus::Columns;
    use crate::partition::ByteRange;
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use std::sync::Arc;
    use std::time::Duration;

    /// Never answers, so the pass stays busy.
    struct Stuck;

    impl Classifier for Stuck {
        fn classify<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<String>> {
            Box::pin(std::future::pending())
        }
    }

    fn busy_assignment() -> Message {
        let chunk = Bytes::from_static(b"A,s,/l,some words\n");
        Message::Assign(Assignment {
            worker: WorkerId(1),
            columns: Columns::default(),
            range: ByteRange {
                offset: 0,
                length: chunk.len(),
            },
            chunk,
            classify: true,
            keep_rows: false,
        })
    }

    async fn serve_with(next: Result<Message>) -> Result<()> {
        let inbox = futures::stream::iter(vec![Ok(busy_assignment()), next])
            .chain(futures::stream::pending());
        let outbox = futures::sink::drain().sink_map_err(|never| match never {});
        let classifier = ClassifierHandle::new(Arc::new(Stuck), Duration::from_secs(3600));
        serve(Box::pin(inbox), outbox, classifier).await
    }

    #[tokio::test]
    async fn abort_while_running_stops_cleanly() -> Result<()> {
        serve_with(Ok(Message::Abort)).await
    }

    #[tokio::test]
    async fn corrupt_frame_while_running_is_an_error() {
        let outcome = serve_with(Err(Error::General("corrupt frame".into()))).await;
        assert!(matches!(outcome, Err(Error::General(reason)) if reason == "corrupt frame"));
    }

    #[tokio::test]
    async fn unexpected_message_while_running_is_an_error() {
        let outcome = serve_with(Ok(busy_assignment())).await;
        assert!(matches!(
            outcome,
            Err(Error::UnexpectedMessage { kind: "assign", .. })
        ));
    }
}
