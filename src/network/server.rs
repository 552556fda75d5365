//! TCP Server
//!
//! Accepts connections and runs each one on its own worker thread.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use super::Connection;
use crate::config::ServerConfig;
use crate::error::{CacheError, Result};
use crate::store::CacheSet;

/// How often the accept loop checks for shutdown
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Open connections, keyed by id, so `stop` can close them
#[derive(Default)]
struct ConnectionRegistry {
    next_id: AtomicU64,
    streams: Mutex<HashMap<u64, TcpStream>>,
}

impl ConnectionRegistry {
    /// Register a stream unless `max` connections are already open
    fn register(&self, stream: &TcpStream, max: usize) -> Result<Option<u64>> {
        let mut streams = self.streams.lock();
        if streams.len() >= max {
            return Ok(None);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        streams.insert(id, stream.try_clone()?);
        Ok(Some(id))
    }

    fn deregister(&self, id: u64) {
        self.streams.lock().remove(&id);
    }

    fn len(&self) -> usize {
        self.streams.lock().len()
    }

    /// Shut down every open socket, unblocking their workers
    fn shutdown_all(&self) {
        for (_, stream) in self.streams.lock().drain() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// State that exists only while the server is RUNNING
struct Running {
    local_addr: SocketAddr,
    store: Arc<CacheSet>,
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<AtomicBool>,
    accept_thread: JoinHandle<()>,
    workers: WaitGroup,
}

/// TCP server for SetCache
///
/// Starts STOPPED. `start` and `stop` are idempotent; the cache set lives
/// exactly as long as one RUNNING period.
pub struct Server {
    config: ServerConfig,
    running: Mutex<Option<Running>>,
}

impl Server {
    /// Create a new (stopped) server with the given config
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            running: Mutex::new(None),
        }
    }

    /// Bind and start accepting connections
    ///
    /// Returns the bound address. Calling `start` on a running server
    /// returns the existing address.
    pub fn start(&self) -> Result<SocketAddr> {
        let mut running = self.running.lock();
        if let Some(state) = running.as_ref() {
            return Ok(state.local_addr);
        }

        if self.config.max_connections == 0 {
            return Err(CacheError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            CacheError::Config(format!("cannot bind {}: {}", self.config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let store = Arc::new(CacheSet::new());
        let registry = Arc::new(ConnectionRegistry::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        let workers = WaitGroup::new();

        let accept_thread = {
            let acceptor = Acceptor {
                listener,
                config: self.config.clone(),
                store: Arc::clone(&store),
                registry: Arc::clone(&registry),
                shutdown: Arc::clone(&shutdown),
                workers: workers.clone(),
            };
            thread::Builder::new()
                .name("setcache-accept".to_string())
                .spawn(move || acceptor.run())?
        };

        tracing::info!("SetCache server listening on {}", local_addr);

        *running = Some(Running {
            local_addr,
            store,
            registry,
            shutdown,
            accept_thread,
            workers,
        });

        Ok(local_addr)
    }

    /// Stop accepting, close every connection and drop the cache set
    ///
    /// Blocks until all connection workers have exited. No-op when stopped.
    pub fn stop(&self) {
        let state = match self.running.lock().take() {
            Some(state) => state,
            None => return,
        };

        tracing::info!("Stopping SetCache server on {}", state.local_addr);

        state.shutdown.store(true, Ordering::SeqCst);
        if state.accept_thread.join().is_err() {
            tracing::error!("Accept thread panicked");
        }

        // No new workers can appear now; unblock the existing ones
        state.registry.shutdown_all();
        state.workers.wait();

        state.store.clear();
        tracing::info!("SetCache server stopped");
    }

    /// Whether the server is RUNNING
    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Bound address while running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().as_ref().map(|s| s.local_addr)
    }

    /// Number of open client connections
    pub fn connection_count(&self) -> usize {
        self.running
            .lock()
            .as_ref()
            .map(|s| s.registry.len())
            .unwrap_or(0)
    }

    /// The live cache set while running
    pub fn store(&self) -> Option<Arc<CacheSet>> {
        self.running.lock().as_ref().map(|s| Arc::clone(&s.store))
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the accept thread owns
struct Acceptor {
    listener: TcpListener,
    config: ServerConfig,
    store: Arc<CacheSet>,
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<AtomicBool>,
    workers: WaitGroup,
}

impl Acceptor {
    fn run(self) {
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.spawn_worker(stream) {
                        tracing::warn!("Failed to start connection for {}: {}", addr, e);
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
        tracing::debug!("Accept loop exited");
    }

    fn spawn_worker(&self, stream: TcpStream) -> Result<()> {
        // Accepted sockets may inherit non-blocking mode from the listener
        stream.set_nonblocking(false)?;

        let id = match self.registry.register(&stream, self.config.max_connections)? {
            Some(id) => id,
            None => {
                tracing::warn!(
                    "Refusing connection from {:?}: {} connections open",
                    stream.peer_addr().ok(),
                    self.config.max_connections
                );
                let _ = stream.shutdown(Shutdown::Both);
                return Ok(());
            }
        };

        let mut connection = match Connection::new(stream, Arc::clone(&self.store)) {
            Ok(connection) => connection,
            Err(e) => {
                self.registry.deregister(id);
                return Err(e);
            }
        };
        if let Err(e) =
            connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)
        {
            self.registry.deregister(id);
            return Err(e);
        }

        let registry = Arc::clone(&self.registry);
        let worker = self.workers.clone();

        let spawned = thread::Builder::new()
            .name(format!("setcache-conn-{}", id))
            .spawn(move || {
                if let Err(e) = connection.handle() {
                    tracing::warn!("Connection {} closed with error: {}", connection.peer_addr(), e);
                }
                registry.deregister(id);
                drop(worker);
            });

        if let Err(e) = spawned {
            self.registry.deregister(id);
            return Err(e.into());
        }

        Ok(())
    }
}
