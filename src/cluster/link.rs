use super::codec::WireCodec;
use super::protocol::{Assignment, Message, WorkerId};
use crate::classify::ClassifierHandle;
use crate::worker::{self, PartialTally};
use crate::{Error, Result};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::codec::Framed;
use tracing::debug;

/// The coordinator's end of a conversation with one worker.
pub trait WorkerLink: Send {
    fn worker(&self) -> WorkerId;

    fn dispatch(
        &mut self,
        assignment: Assignment,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Wait for the worker's single answer.
    fn collect(&mut self) -> impl std::future::Future<Output = Result<PartialTally>> + Send;

    /// Tell the worker to stop. Best effort: errors are swallowed.
    fn abort(&mut self) -> impl std::future::Future<Output = ()> + Send;
}

/// Turn a worker's answer into its tally, checking who sent it.
fn into_partial(expected: WorkerId, reply: Option<Message>) -> Result<PartialTally> {
    match reply {
        Some(Message::Partial { worker, tally }) if worker == expected => Ok(tally),
        Some(Message::Failed { worker, reason }) if worker == expected => {
            Err(Error::WorkerFailed { worker, reason })
        }
        Some(other) => Err(Error::UnexpectedMessage {
            worker: expected,
            kind: other.kind(),
        }),
        None => Err(Error::LinkClosed(expected)),
    }
}

/// A worker running as a task of this process, reached through channels.
/// The assigned chunk is a slice of the shared corpus buffer, not a copy.
pub struct LocalLink {
    worker: WorkerId,
    to_worker: mpsc::UnboundedSender<Message>,
    from_worker: mpsc::UnboundedReceiver<Message>,
    task: JoinHandle<Result<()>>,
}

impl LocalLink {
    pub fn spawn(worker: WorkerId, classifier: ClassifierHandle) -> Self {
        let (to_worker, worker_inbox) = mpsc::unbounded_channel::<Message>();
        let (worker_outbox, from_worker) = mpsc::unbounded_channel::<Message>();

        let inbox = UnboundedReceiverStream::new(worker_inbox).map(Ok::<Message, Error>);
        let outbox = Box::pin(futures::sink::unfold(
            worker_outbox,
            |outbox: mpsc::UnboundedSender<Message>, msg: Message| async move {
                outbox
                    .send(msg)
                    .map_err(|_| Error::General("coordinator stopped listening".into()))?;
                Ok::<_, Error>(outbox)
            },
        ));
        let task = tokio::spawn(worker::serve(inbox, outbox, classifier));

        Self {
            worker,
            to_worker,
            from_worker,
            task,
        }
    }
}

impl WorkerLink for LocalLink {
    fn worker(&self) -> WorkerId {
        self.worker
    }

    async fn dispatch(&mut self, assignment: Assignment) -> Result<()> {
        self.to_worker
            .send(Message::Assign(assignment))
            .map_err(|_| Error::LinkClosed(self.worker))
    }

    async fn collect(&mut self) -> Result<PartialTally> {
        match self.from_worker.recv().await {
            Some(reply) => into_partial(self.worker, Some(reply)),
            // the task ended without answering; surface why
            None => match (&mut self.task).await {
                Ok(Err(e)) => Err(Error::WorkerFailed {
                    worker: self.worker,
                    reason: e.to_string(),
                }),
                Err(e) => Err(Error::Join(e)),
                Ok(Ok(())) => Err(Error::LinkClosed(self.worker)),
            },
        }
    }

    async fn abort(&mut self) {
        let _ = self.to_worker.send(Message::Abort);
        self.task.abort();
        debug!(worker = %self.worker, "local worker aborted");
    }
}

/// A worker at the other end of a byte stream (TCP in practice).
pub struct FramedLink<S> {
    worker: WorkerId,
    framed: Framed<S, WireCodec>,
}

impl<S> FramedLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(worker: WorkerId, stream: S) -> Self {
        Self {
            worker,
            framed: Framed::new(stream, WireCodec::new()),
        }
    }
}

impl<S> WorkerLink for FramedLink<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn worker(&self) -> WorkerId {
        self.worker
    }

    async fn dispatch(&mut self, assignment: Assignment) -> Result<()> {
        self.framed.send(Message::Assign(assignment)).await
    }

    async fn collect(&mut self) -> Result<PartialTally> {
        let reply = self.framed.next().await.transpose()?;
        into_partial(self.worker, reply)
    }

    async fn abort(&mut self) {
        let _ = self.framed.send(Message::Abort).await;
        let _ = self.framed.close().await;
        debug!(worker = %self.worker, "remote worker aborted");
    }
}
