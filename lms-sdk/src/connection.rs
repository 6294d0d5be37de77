//! Background connection worker
//!
//! Spawns a thread with its own current-thread tokio runtime that owns the
//! socket. Everything the registry does happens on this thread, in stream
//! order; callers only read shared state and queue commands.

use std::io;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use lms_protocol::{Command, LineFramer};
use lms_state::{Registry, StateChange};
use parking_lot::{Condvar, Mutex, RwLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc as tokio_mpsc, oneshot};

use crate::config::ConnectionConfig;
use crate::{Result, SdkError};

#[derive(Debug, Default, Clone, Copy)]
struct Status {
    ready: bool,
    closed: bool,
}

/// State shared between the worker and the facade
pub(crate) struct Shared {
    pub(crate) registry: RwLock<Registry>,
    status: Mutex<Status>,
    changed: Condvar,
}

impl Shared {
    pub(crate) fn new(registry: Registry) -> Self {
        Self {
            registry: RwLock::new(registry),
            status: Mutex::new(Status::default()),
            changed: Condvar::new(),
        }
    }

    fn set_ready(&self, ready: bool) {
        let mut status = self.status.lock();
        if status.ready != ready {
            status.ready = ready;
            self.changed.notify_all();
        }
    }

    fn mark_closed(&self) {
        let mut status = self.status.lock();
        status.closed = true;
        status.ready = false;
        self.changed.notify_all();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.status.lock().closed
    }

    /// Block until bootstrap completes, the connection ends, or `timeout`
    pub(crate) fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut status = self.status.lock();

        while !status.ready {
            if status.closed {
                return Err(SdkError::ConnectionClosed);
            }
            if self.changed.wait_until(&mut status, deadline).timed_out() {
                return if status.ready {
                    Ok(())
                } else {
                    Err(SdkError::Timeout(timeout))
                };
            }
        }
        Ok(())
    }
}

/// Handle to the running worker thread
pub(crate) struct ConnectionHandle {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Ask the worker to stop and wait for it
    pub(crate) fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Connection worker panicked");
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Open the connection on a new worker thread
///
/// Returns once the socket is open and bootstrap has been started, or with
/// the error that prevented it.
pub(crate) fn spawn(
    config: ConnectionConfig,
    shared: Arc<Shared>,
    commands: tokio_mpsc::UnboundedReceiver<Command>,
    changes: mpsc::Sender<StateChange>,
) -> Result<ConnectionHandle> {
    let (connected_tx, connected_rx) = oneshot::channel::<io::Result<()>>();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let thread = thread::Builder::new()
        .name("lms-connection".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to create tokio runtime for connection: {}", e);
                    let _ = connected_tx.send(Err(e));
                    return;
                }
            };

            rt.block_on(run(
                config,
                shared,
                commands,
                changes,
                connected_tx,
                shutdown_rx,
            ));
        })?;

    let mut handle = ConnectionHandle {
        shutdown: Some(shutdown_tx),
        thread: Some(thread),
    };

    match connected_rx.blocking_recv() {
        Ok(Ok(())) => Ok(handle),
        Ok(Err(e)) => {
            handle.shutdown();
            Err(SdkError::Io(e))
        }
        Err(_) => {
            handle.shutdown();
            Err(SdkError::Worker(
                "worker exited before reporting the connection".to_string(),
            ))
        }
    }
}

async fn run(
    config: ConnectionConfig,
    shared: Arc<Shared>,
    mut commands: tokio_mpsc::UnboundedReceiver<Command>,
    changes: mpsc::Sender<StateChange>,
    connected_tx: oneshot::Sender<io::Result<()>>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let address = config.address();
    let stream = match tokio::time::timeout(config.connect_timeout, TcpStream::connect(&address))
        .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::warn!("Failed to connect to {}: {}", address, e);
            let _ = connected_tx.send(Err(e));
            return;
        }
        Err(_) => {
            tracing::warn!("Timed out connecting to {}", address);
            let _ = connected_tx.send(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connecting to {address} timed out"),
            )));
            return;
        }
    };

    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Could not set TCP_NODELAY: {}", e);
    }
    let (mut reader, mut writer) = stream.into_split();

    if let Err(e) = shared.registry.write().start() {
        let _ = connected_tx.send(Err(io::Error::other(e.to_string())));
        return;
    }
    tracing::info!("Connected to {}", address);
    let _ = connected_tx.send(Ok(()));

    let mut framer = LineFramer::with_max_line_length(config.max_line_length);
    let mut buf = vec![0u8; config.read_buffer_size];

    let reason = loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break "server closed the connection".to_string(),
                Ok(n) => {
                    framer.push(&buf[..n]);
                    if let Err(reason) = process_lines(&mut framer, &shared) {
                        break reason;
                    }
                }
                Err(e) => break format!("read failed: {e}"),
            },

            command = commands.recv() => match command {
                Some(command) => {
                    if let Err(e) = writer.write_all(command.to_line().as_bytes()).await {
                        break format!("write failed: {e}");
                    }
                }
                None => break "command channel closed".to_string(),
            },

            _ = &mut shutdown_rx => break "shutdown requested".to_string(),
        }
    };

    tracing::info!("Connection to {} ended: {}", address, reason);
    let _ = writer.shutdown().await;

    // Fail further sends, then end the change stream after the close notice
    drop(commands);
    let _ = changes.send(StateChange::ConnectionClosed { reason });
    drop(changes);
    shared.registry.write().close();
    shared.mark_closed();
}

/// Feed every complete line to the registry
///
/// An over-long line or a closed command channel ends the connection.
fn process_lines(framer: &mut LineFramer, shared: &Shared) -> std::result::Result<(), String> {
    let mut registry = shared.registry.write();
    for line in framer.drain() {
        let line = line.map_err(|e| e.to_string())?;
        tracing::debug!("< {}", String::from_utf8_lossy(&line));
        registry
            .handle_line(&line)
            .map_err(|e| format!("registry stopped: {e}"))?;
    }
    let ready = registry.is_ready();
    drop(registry);

    shared.set_ready(ready);
    Ok(())
}
