//! Actor boundary around the controller.
//!
//! The controller runs in its own tokio task, reachable only through a
//! `WorkerHandle`. Each message carries a oneshot channel for its reply.
//! Lifecycle messages are processed one at a time; fetches are served
//! concurrently so a slow request does not hold up the others.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::controller::ResourceCacheController;
use super::fetcher::Fetcher;
use super::http::{Request, Response};
use super::notifications::{ClickOutcome, Notification};
use super::{FetchError, WorkerError};

/// Buffer size for the worker's message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

pub enum WorkerMessage {
    Install {
        reply: oneshot::Sender<Result<usize, WorkerError>>,
    },
    Activate {
        reply: oneshot::Sender<Result<Vec<String>, WorkerError>>,
    },
    Resume {
        reply: oneshot::Sender<Result<bool, WorkerError>>,
    },
    Fetch {
        request: Request,
        reply: oneshot::Sender<Option<Response>>,
    },
    Push {
        payload: Option<String>,
        reply: oneshot::Sender<Notification>,
    },
    NotificationClick {
        action: Option<String>,
        reply: oneshot::Sender<ClickOutcome>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable address of a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerMessage>,
}

/// Move the controller into its own task.
pub fn spawn_worker(controller: ResourceCacheController) -> (WorkerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let task = tokio::spawn(run(Arc::new(controller), rx));
    (WorkerHandle { tx }, task)
}

async fn run(controller: Arc<ResourceCacheController>, mut rx: mpsc::Receiver<WorkerMessage>) {
    info!(cache = %controller.settings().cache_version, "Worker started");

    while let Some(message) = rx.recv().await {
        match message {
            WorkerMessage::Install { reply } => {
                let _ = reply.send(controller.install().await);
            }
            WorkerMessage::Activate { reply } => {
                let _ = reply.send(controller.activate().await);
            }
            WorkerMessage::Resume { reply } => {
                let _ = reply.send(controller.resume().await);
            }
            WorkerMessage::Fetch { request, reply } => {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    let response = controller.handle_fetch(request).await;
                    if reply.send(response).is_err() {
                        debug!("Fetch caller went away before the response");
                    }
                });
            }
            WorkerMessage::Push { payload, reply } => {
                let _ = reply.send(controller.push(payload.as_deref()));
            }
            WorkerMessage::NotificationClick { action, reply } => {
                let _ = reply.send(controller.notification_click(action.as_deref()));
            }
            WorkerMessage::Shutdown { reply } => {
                controller.terminate().await;
                let _ = reply.send(());
                break;
            }
        }
    }

    // All handles dropped without a shutdown
    controller.flush_pending_writes().await;
    info!("Worker stopped");
}

impl WorkerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> WorkerMessage,
    ) -> Result<T, WorkerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| WorkerError::WorkerGone)?;
        rx.await.map_err(|_| WorkerError::WorkerGone)
    }

    pub async fn install(&self) -> Result<usize, WorkerError> {
        self.request(|reply| WorkerMessage::Install { reply }).await?
    }

    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        self.request(|reply| WorkerMessage::Activate { reply }).await?
    }

    pub async fn resume(&self) -> Result<bool, WorkerError> {
        self.request(|reply| WorkerMessage::Resume { reply }).await?
    }

    /// Send a request through the worker. `Ok(None)` is a request the worker
    /// could not answer from network, cache or fallback.
    pub async fn fetch(&self, request: Request) -> Result<Option<Response>, WorkerError> {
        self.request(|reply| WorkerMessage::Fetch { request, reply }).await
    }

    pub async fn push(&self, payload: Option<String>) -> Result<Notification, WorkerError> {
        self.request(|reply| WorkerMessage::Push { payload, reply }).await
    }

    pub async fn notification_click(
        &self,
        action: Option<String>,
    ) -> Result<ClickOutcome, WorkerError> {
        self.request(|reply| WorkerMessage::NotificationClick { action, reply })
            .await
    }

    /// Flush pending cache writes and stop the worker task.
    pub async fn shutdown(&self) -> Result<(), WorkerError> {
        self.request(|reply| WorkerMessage::Shutdown { reply }).await
    }
}

/// Pages fetch through the worker, as a controlled page does.
#[async_trait]
impl Fetcher for WorkerHandle {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        match WorkerHandle::fetch(self, request.clone()).await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(FetchError::Unreachable(format!(
                "no network or cached response for {}",
                request.url
            ))),
            Err(e) => Err(FetchError::Unreachable(e.to_string())),
        }
    }
}
