//! Benchmark for sending and draining 100k messages
//!
//! Measures send throughput, then receive+ack throughput with and without the
//! staging buffer. Fsync on every commit is disabled so the numbers reflect
//! the queue rather than the disk.

use proven_queue::{Error, Options, Queue, Store, StoreConfig};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

const NUM_MESSAGES: usize = 100_000;
const PROGRESS_INTERVAL: usize = 10_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== {NUM_MESSAGES} Message Send/Receive Benchmark ===\n");

    let temp_dir = tempfile::tempdir()?;
    let store = Arc::new(Store::open(
        StoreConfig::new(temp_dir.path()).with_persist_mode(None),
    )?);

    for buffer in [0, 64] {
        let name = format!("bench_{buffer}");
        let queue = Queue::open(
            store.clone(),
            &name,
            Options::new().with_message_buffer_size(buffer),
        )?;

        println!("Queue {name} (message buffer {buffer})");
        let sent = time(|| send_all(&queue))?;
        report("sends", sent);
        let drained = time(|| drain(&queue))?;
        report("receive+ack", drained);

        queue.close()?;
        println!();
    }

    println!("✓ Benchmark complete!");
    Ok(())
}

fn send_all(queue: &Queue) -> Result<(), Error> {
    for i in 0..NUM_MESSAGES {
        queue.send(format!("message_{i}"))?;
        progress(i);
    }
    Ok(())
}

fn drain(queue: &Queue) -> Result<(), Error> {
    let mut received = 0;
    loop {
        match queue.try_receive() {
            Ok(message) => {
                message.ack()?;
                progress(received);
                received += 1;
            }
            Err(Error::Empty) => break,
            Err(e) => return Err(e),
        }
    }
    if received != NUM_MESSAGES {
        eprintln!("⚠ Drained {received} of {NUM_MESSAGES} messages");
    }
    Ok(())
}

fn time(f: impl FnOnce() -> Result<(), Error>) -> Result<f64, Error> {
    let start = Instant::now();
    f()?;
    eprintln!();
    Ok(start.elapsed().as_secs_f64())
}

fn progress(i: usize) {
    if (i + 1) % PROGRESS_INTERVAL == 0 {
        eprint!(".");
        let _ = io::stderr().flush();
    }
}

fn report(what: &str, seconds: f64) {
    println!(
        "  {what:<12} {seconds:>6.2}s  {:>8.0}/sec  {:.3} ms avg",
        NUM_MESSAGES as f64 / seconds,
        seconds * 1000.0 / NUM_MESSAGES as f64
    );
}
