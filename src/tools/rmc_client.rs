use std::error::Error;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;
use clap::Parser;

use rmc::data::response::is_status_line;

/// Command line client for the remote music control server
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Server hostname or IP address
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[clap(short, long, default_value_t = 2000)]
    port: u16,

    /// Seconds to wait for a response
    #[clap(short, long, default_value_t = 30)]
    timeout: u64,

    /// Commands to send, e.g. "LIST rock" "PLAY queen/bohemian". Reads commands from
    /// stdin when none are given.
    commands: Vec<String>,
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Connection {
    fn open(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let stream = TcpStream::connect((cli.host.as_str(), cli.port))?;
        stream.set_read_timeout(Some(Duration::from_secs(cli.timeout)))?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    /// Read lines up to and including the next status line.
    ///
    /// Returns `None` if the server closed the connection first.
    fn read_response(&mut self) -> io::Result<Option<Vec<String>>> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                if lines.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(lines));
            }
            let line = line.trim_end_matches(['\r', '\n']).to_string();
            let done = is_status_line(&line);
            lines.push(line);
            if done {
                return Ok(Some(lines));
            }
        }
    }

    fn send(&mut self, command: &str) -> io::Result<Option<Vec<String>>> {
        writeln!(self.writer, "{}", command)?;
        self.writer.flush()?;
        self.read_response()
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Returns false once the session is over
fn exchange(connection: &mut Connection, command: &str) -> Result<bool, Box<dyn Error>> {
    match connection.send(command)? {
        Some(lines) => {
            print_lines(&lines);
            let closed = lines
                .last()
                .is_some_and(|l| l == "ACK: EXIT" || l == "ACK: TIMEOUT" || l == "ACK: SESSION EXPIRED");
            Ok(!closed)
        }
        None => {
            eprintln!("Connection closed by server");
            Ok(false)
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let mut connection = Connection::open(&cli)?;

    // Greeting, or the busy notice
    match connection.read_response()? {
        Some(lines) => {
            print_lines(&lines);
            if lines.last().is_some_and(|l| l.starts_with("NACK")) {
                std::process::exit(1);
            }
        }
        None => {
            eprintln!("Connection closed by server");
            std::process::exit(1);
        }
    }

    if !cli.commands.is_empty() {
        for command in &cli.commands {
            if !exchange(&mut connection, command)? {
                return Ok(());
            }
        }
        exchange(&mut connection, "EXIT")?;
        return Ok(());
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if !exchange(&mut connection, line.trim())? {
            return Ok(());
        }
    }
    exchange(&mut connection, "EXIT")?;
    Ok(())
}
