// Common helpers for integration tests

use rmc::players::NullPlayerController;
use rmc::server::{CommandDispatcher, RmcServer, ServerHandle, SessionSettings};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub use serial_test::serial;

/// A server running on an ephemeral local port with a recording player
pub struct TestServer {
    pub handle: ServerHandle,
    pub player: Arc<NullPlayerController>,
    pub music: TempDir,
}

impl TestServer {
    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    pub fn connect(&self) -> Client {
        Client::connect(self.addr())
    }

    /// Wait until the running session, if any, has released the server
    pub fn wait_until_idle(&self) {
        assert!(
            wait_until(Duration::from_secs(5), || !self.handle.is_session_active()),
            "session did not end"
        );
    }
}

// Music directory with a few songs, a non-audio file and nested folders
pub fn music_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("song1.mp3"), b"").unwrap();
    fs::write(root.join("track2.wav"), b"").unwrap();
    fs::write(root.join("notes.txt"), b"").unwrap();
    fs::create_dir_all(root.join("Rock/Queen")).unwrap();
    fs::write(root.join("Rock/Queen/Bohemian Rhapsody.mp3"), b"").unwrap();
    fs::write(root.join("Rock/Queen/Radio Ga Ga.mp3"), b"").unwrap();
    dir
}

pub fn start_server(settings: SessionSettings) -> TestServer {
    let music = music_tree();
    let player = Arc::new(NullPlayerController::new());
    let extensions = vec!["mp3".to_string(), "wav".to_string()];
    let dispatcher = CommandDispatcher::new(music.path().to_path_buf(), player.clone(), &extensions);
    let server = RmcServer::bind("127.0.0.1:0", dispatcher, settings).unwrap();
    let handle = server.spawn().unwrap();
    TestServer { handle, player, music }
}

/// Settings without any timers
pub fn no_timeouts() -> SessionSettings {
    SessionSettings {
        idle_timeout: None,
        max_session_length: None,
    }
}

pub fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

/// Line based protocol client
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let writer = stream.try_clone().unwrap();
        Self {
            reader: BufReader::new(stream),
            writer,
        }
    }

    /// Next line without its terminator, `None` once the server closed the connection
    pub fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    /// Lines up to and including the next status line
    pub fn read_response(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line() {
            let done = line.starts_with("ACK:") || line.starts_with("NACK (");
            lines.push(line);
            if done {
                break;
            }
        }
        lines
    }

    pub fn send_line(&mut self, line: &str) {
        writeln!(self.writer, "{}", line).unwrap();
        self.writer.flush().unwrap();
    }

    pub fn send(&mut self, line: &str) -> Vec<String> {
        self.send_line(line);
        self.read_response()
    }

    /// True if the server closed the connection without sending anything else
    pub fn is_closed(&mut self) -> bool {
        self.read_line().is_none()
    }
}

pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
