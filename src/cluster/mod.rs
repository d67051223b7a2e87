mod codec;
mod coordinator;
mod link;
mod protocol;
mod remote;

pub use codec::{MAX_FRAME_BYTES, WireCodec};
pub use coordinator::{Coordinator, Phase, Reduction};
pub use link::{FramedLink, LocalLink, WorkerLink};
pub use protocol::{Assignment, Message, WorkerId};
pub use remote::{accept_workers, run_remote_worker};

use crate::classify::ClassifierHandle;
use crate::config::RunSettings;
use crate::corpus::{Columns, Corpus};
use crate::{Error, Result};
use tokio::net::TcpListener;
use tracing::info;

/// Run with `settings.workers - 1` workers spawned as tasks of this process.
pub async fn run_local(
    corpus: &Corpus,
    columns: Columns,
    settings: &RunSettings,
    classifier: ClassifierHandle,
) -> Result<Reduction> {
    if settings.workers == 0 {
        return Err(Error::InvalidWorkerCount);
    }
    info!(workers = settings.workers, "running with local workers");
    let links = (1..settings.workers)
        .map(|i| LocalLink::spawn(WorkerId(i), classifier.clone()))
        .collect();
    Coordinator::new(settings.clone(), classifier)
        .run(corpus, columns, links)
        .await
}

/// Bind `address` and run once `settings.workers - 1` remote workers joined.
pub async fn run_with_listener(
    address: &str,
    corpus: &Corpus,
    columns: Columns,
    settings: &RunSettings,
    classifier: ClassifierHandle,
) -> Result<Reduction> {
    let listener = TcpListener::bind(address).await?;
    run_with_tcp_listener(listener, corpus, columns, settings, classifier).await
}

pub async fn run_with_tcp_listener(
    listener: TcpListener,
    corpus: &Corpus,
    columns: Columns,
    settings: &RunSettings,
    classifier: ClassifierHandle,
) -> Result<Reduction> {
    if settings.workers == 0 {
        return Err(Error::InvalidWorkerCount);
    }
    let links = accept_workers(listener, settings.workers - 1, settings.collect_timeout).await?;
    Coordinator::new(settings.clone(), classifier)
        .run(corpus, columns, links)
        .await
}
