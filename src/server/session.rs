use crate::data::response::{greeting, SESSION_EXPIRED_NOTICE, TIMEOUT_NOTICE};
use crate::data::Playlist;
use crate::helpers::SessionTimer;
use crate::server::connection_manager::{ResponseWriter, SessionSettings, SessionSlot};
use crate::server::dispatcher::CommandDispatcher;
use std::io::{BufRead, BufReader};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use log::{debug, info, warn};

/// Arm `timer` so that on expiry the session of `generation` receives `notice` and is closed
fn arm_close(timer: &SessionTimer, slot: &Arc<SessionSlot>, generation: u64, notice: &'static str) {
    let slot = Arc::clone(slot);
    timer.arm(move || {
        if slot.close_if_current(generation, notice) {
            info!("Session closed: {}", notice);
        }
    });
}

/// Run one client session to completion and free the slot afterwards
pub fn run_session(
    slot: &Arc<SessionSlot>,
    generation: u64,
    stream: TcpStream,
    dispatcher: &CommandDispatcher,
    settings: &SessionSettings,
) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown peer".to_string());
    info!("Session started: {}", peer);

    let read_half = match stream.try_clone() {
        Ok(read_half) => read_half,
        Err(e) => {
            warn!("Could not set up session for {}: {}", peer, e);
            let _ = stream.shutdown(Shutdown::Both);
            slot.release(generation);
            return;
        }
    };

    let writer = ResponseWriter::new(stream);
    slot.activate(generation, writer.clone());

    let idle_timer = SessionTimer::new("idle", settings.idle_timeout);
    let session_timer = SessionTimer::new("session", settings.max_session_length);
    arm_close(&idle_timer, slot, generation, TIMEOUT_NOTICE);
    arm_close(&session_timer, slot, generation, SESSION_EXPIRED_NOTICE);

    let commands = if writer.write_line(&greeting()).is_ok() {
        serve(BufReader::new(read_half), &writer, dispatcher, || {
            arm_close(&idle_timer, slot, generation, TIMEOUT_NOTICE)
        })
    } else {
        0
    };

    // Timers first: a firing timer takes the slot lock
    idle_timer.cancel();
    session_timer.cancel();
    writer.shutdown();
    slot.release(generation);
    info!("Session ended: {} after {} command(s)", peer, commands);
}

/// Read and answer lines until the client leaves, asks to exit or the connection fails.
///
/// `on_line` runs for every line read, before it is processed. Returns the number of
/// commands processed.
fn serve<R, F>(mut reader: R, writer: &ResponseWriter, dispatcher: &CommandDispatcher, on_line: F) -> u64
where
    R: BufRead,
    F: Fn(),
{
    let mut playlist = Playlist::new();
    let mut command_no: u64 = 0;
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => {
                debug!("Client closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Read failed: {}", e);
                break;
            }
        }
        on_line();

        let text = String::from_utf8_lossy(&buffer);
        let line = text.trim();
        if line.is_empty() {
            continue;
        }

        info!("#{:04}: {}", command_no, line);
        command_no += 1;

        let Some(reply) = dispatcher.dispatch(line, &mut playlist) else {
            continue;
        };
        if let Err(e) = writer.write_lines(&reply.lines) {
            debug!("Write failed: {}", e);
            break;
        }
        if reply.terminate {
            break;
        }
    }

    command_no
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::NullPlayerController;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn dispatcher(dir: &TempDir) -> CommandDispatcher {
        std::fs::write(dir.path().join("song1.mp3"), b"").unwrap();
        CommandDispatcher::new(
            dir.path().to_path_buf(),
            Arc::new(NullPlayerController::new()),
            &["mp3".to_string()],
        )
    }

    fn start(settings: SessionSettings) -> (TcpStream, Arc<SessionSlot>, thread::JoinHandle<()>, TempDir) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();

        let slot = Arc::new(SessionSlot::new());
        assert!(slot.try_admit(server));
        let (generation, stream) = slot.wait_for_connection();

        let dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(&dir);
        let session_slot = slot.clone();
        let handle = thread::spawn(move || {
            run_session(&session_slot, generation, stream, &dispatcher, &settings);
        });
        (client, slot, handle, dir)
    }

    fn read_all(mut client: TcpStream) -> String {
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut output = String::new();
        client.read_to_string(&mut output).unwrap();
        output
    }

    #[test]
    fn test_session_answers_until_exit() {
        let disabled = SessionSettings {
            idle_timeout: None,
            max_session_length: None,
        };
        let (mut client, slot, handle, _dir) = start(disabled);

        client.write_all(b"\r\n  \nplay song\nPLAYLIST\r\nexit\n").unwrap();
        let output = read_all(client);
        assert_eq!(
            output,
            "ACK: jRMC\nACK: PLAY \"song1.mp3\"\nsong1.mp3\nACK: PLAYLIST\nACK: EXIT\n"
        );

        handle.join().unwrap();
        assert!(!slot.is_connected());
    }

    #[test]
    fn test_idle_timeout_closes_session() {
        let settings = SessionSettings {
            idle_timeout: Some(Duration::from_millis(200)),
            max_session_length: None,
        };
        let (client, slot, handle, _dir) = start(settings);

        assert_eq!(read_all(client), "ACK: jRMC\nACK: TIMEOUT\n");
        handle.join().unwrap();
        assert!(!slot.is_connected());
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let disabled = SessionSettings {
            idle_timeout: None,
            max_session_length: None,
        };
        let (mut client, _slot, handle, _dir) = start(disabled);

        client.write_all(b"fo\xffo\nexit\n").unwrap();
        let output = read_all(client);
        assert_eq!(
            output,
            "ACK: jRMC\nNACK (Command not recognised): fo\u{fffd}o\nACK: EXIT\n"
        );
        handle.join().unwrap();
    }
}
