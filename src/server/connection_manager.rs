//! Admission of client connections.
//!
//! The server talks to one client at a time. The accept loop runs on its own thread and hands
//! admitted sockets to the session loop through a [`SessionSlot`]. Every admission gets a new
//! generation number; timer callbacks carry the generation of the session that armed them, so
//! a late callback can never touch a newer session.

use crate::data::response::busy_notice;
use crate::server::dispatcher::CommandDispatcher;
use crate::server::session::run_session;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use log::{debug, error, info, warn};

/// Upper bound for writing to a client that does not read
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timer settings applied to every session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Close the session after this long without input
    pub idle_timeout: Option<Duration>,
    /// Close the session this long after it started
    pub max_session_length: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Some(Duration::from_secs(90)),
            max_session_length: Some(Duration::from_secs(300)),
        }
    }
}

/// Line oriented writer shared by the session loop and its timers.
///
/// Each call writes complete lines under one lock, so output of different writers never
/// interleaves within a line.
#[derive(Clone)]
pub struct ResponseWriter {
    stream: Arc<Mutex<TcpStream>>,
}

impl ResponseWriter {
    pub fn new(stream: TcpStream) -> Self {
        if let Err(e) = stream.set_write_timeout(Some(WRITE_TIMEOUT)) {
            debug!("Could not set write timeout: {}", e);
        }
        Self {
            stream: Arc::new(Mutex::new(stream)),
        }
    }

    pub fn write_lines(&self, lines: &[String]) -> io::Result<()> {
        let mut buffer = String::new();
        for line in lines {
            buffer.push_str(line);
            buffer.push('\n');
        }
        let mut stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        stream.write_all(buffer.as_bytes())?;
        stream.flush()
    }

    pub fn write_line(&self, line: &str) -> io::Result<()> {
        self.write_lines(&[line.to_string()])
    }

    /// Close both directions. Closing an already closed stream is harmless.
    pub fn shutdown(&self) {
        let stream = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            debug!("Shutdown of client stream failed: {}", e);
        }
    }
}

#[derive(Default)]
struct SlotState {
    /// A session is pending or running
    connected: bool,
    /// Admitted stream waiting for the session loop
    pending: Option<TcpStream>,
    generation: u64,
    /// Writer of the running session
    active: Option<ResponseWriter>,
}

/// The single place a client session can occupy
#[derive(Default)]
pub struct SessionSlot {
    state: Mutex<SlotState>,
    available: Condvar,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `stream` as the next session, or turn it away if a session is active.
    ///
    /// Returns whether the stream was admitted.
    pub fn try_admit(&self, stream: TcpStream) -> bool {
        let rejected = {
            let mut state = self.lock();
            if state.connected {
                Some(stream)
            } else {
                state.connected = true;
                state.generation += 1;
                state.pending = Some(stream);
                self.available.notify_one();
                None
            }
        };

        match rejected {
            Some(stream) => {
                reject(stream);
                false
            }
            None => true,
        }
    }

    /// Block until a stream was admitted and take it, together with its generation
    pub fn wait_for_connection(&self) -> (u64, TcpStream) {
        let mut state = self.lock();
        loop {
            if let Some(stream) = state.pending.take() {
                return (state.generation, stream);
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Register the writer of the running session so timers can reach the client
    pub fn activate(&self, generation: u64, writer: ResponseWriter) {
        let mut state = self.lock();
        if state.generation == generation {
            state.active = Some(writer);
        }
    }

    /// Send `notice` to the session of `generation` and close its connection.
    ///
    /// Does nothing if that session has already ended. Returns whether it was closed.
    pub fn close_if_current(&self, generation: u64, notice: &str) -> bool {
        let writer = {
            let state = self.lock();
            if !state.connected || state.generation != generation {
                return false;
            }
            match &state.active {
                Some(writer) => writer.clone(),
                None => return false,
            }
        };

        // No socket I/O under the slot lock
        if let Err(e) = writer.write_line(notice) {
            debug!("Could not send '{}': {}", notice, e);
        }
        writer.shutdown();
        true
    }

    /// Free the slot held by the session of `generation`
    pub fn release(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation == generation {
            state.connected = false;
            state.pending = None;
            state.active = None;
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }
}

/// Tell a client that the server is busy and hang up
fn reject(mut stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown peer".to_string());
    info!("Rejected connection from {}: session active", peer);

    if let Err(e) = stream.set_write_timeout(Some(WRITE_TIMEOUT)) {
        debug!("Could not set write timeout: {}", e);
    }
    let notice = format!("{}\n", busy_notice());
    if let Err(e) = stream.write_all(notice.as_bytes()).and_then(|_| stream.flush()) {
        debug!("Could not send busy notice to {}: {}", peer, e);
    }
    let _ = stream.shutdown(Shutdown::Both);
}

/// Accept connections forever, admitting at most one session at a time
fn accept_loop(listener: TcpListener, slot: Arc<SessionSlot>) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let peer = stream.peer_addr().ok();
                if slot.try_admit(stream) {
                    if let Some(peer) = peer {
                        info!("Accepted connection from {}", peer);
                    }
                }
            }
            Err(e) => warn!("Failed to accept connection: {}", e),
        }
    }
    error!("Accept loop ended");
}

/// The remote music control server
pub struct RmcServer {
    listener: TcpListener,
    slot: Arc<SessionSlot>,
    dispatcher: CommandDispatcher,
    settings: SessionSettings,
}

impl RmcServer {
    pub fn bind<A: ToSocketAddrs>(
        address: A,
        dispatcher: CommandDispatcher,
        settings: SessionSettings,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(address)?;
        info!("Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            slot: Arc::new(SessionSlot::new()),
            dispatcher,
            settings,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve clients forever.
    ///
    /// Connections are accepted on a separate thread; sessions run on the calling thread.
    pub fn run(self) -> io::Result<()> {
        let listener = self.listener.try_clone()?;
        let slot = Arc::clone(&self.slot);
        thread::Builder::new()
            .name("rmc-accept".to_string())
            .spawn(move || accept_loop(listener, slot))?;

        loop {
            let (generation, stream) = self.slot.wait_for_connection();
            run_session(&self.slot, generation, stream, &self.dispatcher, &self.settings);
        }
    }

    /// Serve clients on a background thread
    pub fn spawn(self) -> io::Result<ServerHandle> {
        let handle = ServerHandle {
            local_addr: self.local_addr()?,
            slot: Arc::clone(&self.slot),
        };
        thread::Builder::new()
            .name("rmc-sessions".to_string())
            .spawn(move || {
                if let Err(e) = self.run() {
                    error!("Server stopped: {}", e);
                }
            })?;
        Ok(handle)
    }
}

/// Handle to a server running in the background
#[derive(Clone)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    slot: Arc<SessionSlot>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether a client session currently occupies the server
    pub fn is_session_active(&self) -> bool {
        self.slot.is_connected()
    }
}
