use super::codec::WireCodec;
use super::link::FramedLink;
use super::protocol::WorkerId;
use crate::classify::ClassifierHandle;
use crate::{Error, Result, worker};
use futures::StreamExt;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::codec::Framed;
use tracing::info;

/// Accept `count` worker connections, numbering them 1..=count in arrival
/// order. Gives up once `wait` has passed without the full set.
pub async fn accept_workers(
    listener: TcpListener,
    count: usize,
    wait: Duration,
) -> Result<Vec<FramedLink<TcpStream>>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    info!(address = %listener.local_addr()?, count, "waiting for workers");

    let mut incoming = TcpListenerStream::new(listener);
    let mut links = Vec::with_capacity(count);
    let accepting = async {
        while links.len() < count {
            let Some(stream) = incoming.next().await else {
                break;
            };
            let stream = stream?;
            let worker = WorkerId(links.len() + 1);
            info!(%worker, peer = %stream.peer_addr()?, "worker connected");
            stream.set_nodelay(true)?;
            links.push(FramedLink::new(worker, stream));
        }
        Ok::<_, Error>(())
    };

    let outcome = tokio::time::timeout(wait, accepting).await;
    match outcome {
        Ok(accepted) => accepted?,
        Err(_) => {
            return Err(Error::WorkerTimeout {
                worker: WorkerId(links.len() + 1),
                waited: wait,
            });
        }
    }
    if links.len() < count {
        return Err(Error::General(format!(
            "listener closed after {} of {count} workers connected",
            links.len()
        )));
    }
    Ok(links)
}

/// Connect to a coordinator and serve one assignment.
pub async fn run_remote_worker(address: &str, classifier: ClassifierHandle) -> Result<()> {
    let stream = TcpStream::connect(address).await?;
    stream.set_nodelay(true)?;
    info!(%address, "connected to coordinator");
    let (sink, stream) = Framed::new(stream, WireCodec::new()).split();
    worker::serve(stream, sink, classifier).await
}
