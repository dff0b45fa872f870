//! Bounded single-consumer work queues.
//!
//! Each [`WorkQueue`] owns exactly one worker task, which processes items
//! strictly in the order they were pushed.

use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Consumes the items of a [`WorkQueue`], one at a time.
#[async_trait]
pub trait Process<T>: Send + Sync + 'static {
    async fn process(&self, item: T);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is at capacity.
    Full,
    /// The queue was shut down.
    Closed,
}

impl std::error::Error for QueueError {}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueueError::Full => write!(f, "queue is full"),
            QueueError::Closed => write!(f, "queue is closed"),
        }
    }
}

struct Worker {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct WorkQueue<T> {
    name: &'static str,
    tx: mpsc::Sender<T>,
    rx: Mutex<Option<mpsc::Receiver<T>>>,
    worker: tokio::sync::Mutex<Option<Worker>>,
}

impl<T: Send + 'static> WorkQueue<T> {
    /// Creates a queue holding at most `capacity` items (at least one).
    ///
    /// Items can be pushed right away; nothing is processed until
    /// [`WorkQueue::start`] is called.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        WorkQueue {
            name,
            tx,
            rx: Mutex::new(Some(rx)),
            worker: tokio::sync::Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Spawns the worker. Returns `false` if it was already started.
    pub async fn start<P: Process<T>>(&self, processor: P) -> bool {
        let mut worker = self.worker.lock().await;
        let Some(rx) = self.take_receiver() else {
            tracing::debug!("{} worker already started", self.name);
            return false;
        };
        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(run(self.name, rx, stopped, processor));
        *worker = Some(Worker { stop, handle });
        tracing::info!("{} worker started", self.name);
        true
    }

    /// Waits for room in the queue.
    pub async fn push(&self, item: T) -> Result<(), QueueError> {
        self.tx.send(item).await.map_err(|_| QueueError::Closed)
    }

    /// Fails immediately if the queue is full.
    pub fn try_push(&self, item: T) -> Result<(), QueueError> {
        self.tx.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => QueueError::Full,
            mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Stops accepting items, processes everything already queued and waits
    /// for the worker to exit.
    pub async fn shutdown(&self) {
        let worker = self.worker.lock().await.take();
        match worker {
            Some(Worker { stop, handle }) => {
                // The worker may already have exited if it panicked.
                let _ = stop.send(());
                if let Err(e) = handle.await {
                    tracing::error!("{} worker failed: {e:?}", self.name);
                }
            }
            None => {
                if let Some(mut rx) = self.take_receiver() {
                    rx.close();
                    let mut dropped = 0;
                    while rx.try_recv().is_ok() {
                        dropped += 1;
                    }
                    if dropped > 0 {
                        tracing::warn!(
                            "{} shut down before starting, dropped {dropped} items",
                            self.name
                        );
                    }
                }
            }
        }
    }

    fn take_receiver(&self) -> Option<mpsc::Receiver<T>> {
        match self.rx.lock() {
            Ok(mut rx) => rx.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

async fn run<T, P: Process<T>>(
    name: &'static str,
    mut rx: mpsc::Receiver<T>,
    mut stop: oneshot::Receiver<()>,
    processor: P,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            item = rx.recv() => match item {
                Some(item) => processor.process(item).await,
                None => return,
            },
        }
    }

    rx.close();
    let mut drained = 0;
    while let Some(item) = rx.recv().await {
        processor.process(item).await;
        drained += 1;
    }
    tracing::info!("{name} worker stopped, drained {drained} items");
}
