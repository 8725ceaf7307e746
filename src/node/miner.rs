//! Cooperative mining worker
//!
//! Grinds nonces in short batches, yielding between attempts and polling
//! for a replacement candidate between batches. A new candidate always
//! wins; nonce progress on the old one is discarded.

use crate::core::Block;
use crate::node::Event;
use log::info;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TryRecvError};
use std::thread;
use std::time::Duration;

/// Nonce attempts between candidate polls
const BATCH_SIZE: u64 = 100;
/// Yield between attempts
const ATTEMPT_DELAY: Duration = Duration::from_millis(10);
const CANDIDATE_QUEUE_DEPTH: usize = 4;

/// Spawn the mining worker. Candidates go in through the returned sender;
/// mined blocks come back as `Event::Mined`.
pub fn start(events: SyncSender<Event>) -> SyncSender<Block> {
    let (candidates, candidate_rx) = sync_channel(CANDIDATE_QUEUE_DEPTH);
    thread::spawn(move || mine_loop(candidate_rx, events));
    candidates
}

fn mine_loop(candidates: Receiver<Block>, events: SyncSender<Event>) {
    info!("Started miner");
    let mut current: Option<Block> = None;

    loop {
        // Prefer a fresh candidate; with nothing to mine, block until one
        // arrives
        match candidates.try_recv() {
            Ok(block) => {
                info!("Started mining block {}", block.id);
                current = Some(block);
            }
            Err(TryRecvError::Empty) => {
                if current.is_none() {
                    match candidates.recv() {
                        Ok(block) => {
                            info!("Started mining block {}", block.id);
                            current = Some(block);
                        }
                        Err(_) => return,
                    }
                }
            }
            Err(TryRecvError::Disconnected) => return,
        }

        let Some(mut block) = current.take() else {
            continue;
        };

        if try_mine(&mut block) {
            info!("Successfully mined block {}", block.id);
            if events.send(Event::Mined(block)).is_err() {
                return;
            }
        } else {
            current = Some(block);
        }
    }
}

/// One bounded batch of attempts; true when the block now satisfies its
/// target.
fn try_mine(block: &mut Block) -> bool {
    for _ in 0..BATCH_SIZE {
        if block.target.is_met_by(&block.hash()) {
            return true;
        }

        block.pow += 1;
        thread::sleep(ATTEMPT_DELAY);
    }

    false
}
