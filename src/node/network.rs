//! Peer networking
//!
//! Three kinds of task: an accept loop on the TCP listener, a reader per
//! peer connection feeding decoded packets into the node's event channel,
//! and a single sender that owns the peer list and fans out broadcasts.
//! A read or write failure tears down that peer only.

use crate::error::{ChainError, Result};
use crate::node::{Event, Packet};
use log::{error, info, warn};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread;

const PEER_QUEUE_DEPTH: usize = 16;

enum PeerMessage {
    Register(TcpStream),
    Broadcast(Packet),
}

pub struct Network {
    peers: SyncSender<PeerMessage>,
    events: SyncSender<Event>,
}

impl Network {
    /// Bind the peer listener and spawn the accept and sender tasks.
    pub fn start(port: u16, events: SyncSender<Event>) -> Result<Network> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .map_err(|e| ChainError::Network(format!("Failed to bind port {port}: {e}")))?;

        let (peers, peer_rx) = sync_channel(PEER_QUEUE_DEPTH);
        thread::spawn(move || sender_loop(peer_rx));

        let accept_peers = peers.clone();
        let accept_events = events.clone();
        thread::spawn(move || accept_loop(listener, accept_peers, accept_events));

        info!("Listening for peers on port {port}");
        Ok(Network { peers, events })
    }

    /// Dial a peer, register it for broadcasts and greet the network.
    pub fn connect(&self, address: &str) -> Result<()> {
        let stream = TcpStream::connect(address)
            .map_err(|e| ChainError::Network(format!("Failed to connect to {address}: {e}")))?;

        register_peer(stream, &self.peers, &self.events)?;
        self.broadcast(Packet::HandShake);
        Ok(())
    }

    /// Queue a packet for every connected peer.
    pub fn broadcast(&self, packet: Packet) {
        if self.peers.send(PeerMessage::Broadcast(packet)).is_err() {
            warn!("Peer sender is gone; dropping packet");
        }
    }
}

fn register_peer(
    stream: TcpStream,
    peers: &SyncSender<PeerMessage>,
    events: &SyncSender<Event>,
) -> Result<()> {
    let reader = stream
        .try_clone()
        .map_err(|e| ChainError::Network(format!("Failed to clone peer stream: {e}")))?;

    let events = events.clone();
    thread::spawn(move || read_loop(reader, events));

    peers
        .send(PeerMessage::Register(stream))
        .map_err(|_| ChainError::Network("Peer sender is gone".to_string()))
}

fn accept_loop(
    listener: TcpListener,
    peers: SyncSender<PeerMessage>,
    events: SyncSender<Event>,
) {
    for connection in listener.incoming() {
        match connection {
            Ok(stream) => {
                if let Err(e) = register_peer(stream, &peers, &events) {
                    error!("Failed to register peer: {e}");
                }
            }
            Err(e) => error!("Error accepting connection: {e}"),
        }
    }
}

fn read_loop(stream: TcpStream, events: SyncSender<Event>) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    info!("Connected to peer {peer}");

    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Read from {peer} failed: {e}");
                break;
            }
        };

        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Packet>(&line) {
            Ok(packet) => {
                if events.send(Event::Packet(packet)).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("Undecodable packet from {peer}: {e}");
                break;
            }
        }
    }

    info!("Peer {peer} disconnected");
}

fn sender_loop(receiver: Receiver<PeerMessage>) {
    let mut peers: Vec<TcpStream> = Vec::new();

    for message in receiver {
        match message {
            PeerMessage::Register(stream) => peers.push(stream),
            PeerMessage::Broadcast(packet) => {
                let mut line = match serde_json::to_string(&packet) {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Failed to encode packet: {e}");
                        continue;
                    }
                };
                line.push('\n');

                peers.retain_mut(|peer| match peer.write_all(line.as_bytes()) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Dropping peer after failed write: {e}");
                        false
                    }
                });
            }
        }
    }
}
