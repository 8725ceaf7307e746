//! Local control socket
//!
//! Wallet operations reach the node as newline-delimited JSON commands on
//! a unix stream socket. Each command is round-tripped through the node
//! event loop over a one-shot reply channel, so command handling is
//! serialized with every other event. The wallet key travels as PKCS#8 DER
//! bytes: wallet files belong to the CLI process, never the node.

use crate::core::Block;
use crate::error::{ChainError, Result};
use crate::node::Event;
use crate::wallet::Address;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::mpsc::{self, SyncSender};
use std::thread;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    Ping,
    Connect {
        node_address: String,
    },
    Balance {
        address: Address,
    },
    Send {
        wallet: Vec<u8>,
        address: Address,
        amount: f32,
    },
    Page {
        wallet: Vec<u8>,
        name: String,
        length: u32,
        chunks: Vec<[u8; 32]>,
    },
    Block {
        id: u64,
    },
    Stats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub balance: f32,
    #[serde(default)]
    pub block: Option<Block>,
}

impl Response {
    pub fn error(message: String) -> Response {
        Response {
            error: message,
            ..Response::default()
        }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// A command paired with the channel its response goes back on.
pub struct CommandRequest {
    pub command: Command,
    pub reply: mpsc::Sender<Response>,
}

/// Bind the control socket and feed parsed commands into the node loop.
pub fn listen(path: &Path, events: SyncSender<Event>) -> Result<()> {
    // A previous run may have left its socket file behind
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }

    let listener = UnixListener::bind(path)
        .map_err(|e| ChainError::Ipc(format!("Failed to bind control socket {path:?}: {e}")))?;

    thread::spawn(move || {
        for connection in listener.incoming() {
            match connection {
                Ok(stream) => {
                    let events = events.clone();
                    thread::spawn(move || handle_connection(stream, events));
                }
                Err(e) => warn!("Control socket accept failed: {e}"),
            }
        }
    });

    Ok(())
}

fn handle_connection(stream: UnixStream, events: SyncSender<Event>) {
    info!("Got IPC connection");

    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(e) => {
            warn!("Failed to clone control stream: {e}");
            return;
        }
    };

    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Command>(&line) {
            Ok(command) => run_command(command, &events),
            Err(e) => Response::error(format!("Invalid command: {e}")),
        };

        let mut encoded = match serde_json::to_string(&response) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Failed to encode response: {e}");
                break;
            }
        };
        encoded.push('\n');

        if writer.write_all(encoded.as_bytes()).is_err() {
            break;
        }
    }
}

fn run_command(command: Command, events: &SyncSender<Event>) -> Response {
    let (reply, reply_rx) = mpsc::channel();

    let request = CommandRequest { command, reply };
    if events.send(Event::Command(request)).is_err() {
        return Response::error("Node is shutting down".to_string());
    }

    reply_rx
        .recv()
        .unwrap_or_else(|_| Response::error("Node dropped the command".to_string()))
}

/// Client side: one command out, one response back.
pub fn send_command(path: &Path, command: &Command) -> Result<Response> {
    let mut stream = UnixStream::connect(path)
        .map_err(|e| ChainError::Ipc(format!("Failed to reach node at {path:?}: {e}")))?;

    let mut encoded = serde_json::to_string(command)?;
    encoded.push('\n');
    stream.write_all(encoded.as_bytes())?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line)?;

    let response = serde_json::from_str(line.trim_end())?;
    Ok(response)
}
