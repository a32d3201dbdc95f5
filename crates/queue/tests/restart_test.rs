//! Durability across store reopens

use proven_queue::{Error, Id, Options, Queue, Status, Store, StoreConfig};
use std::path::Path;
use std::sync::Arc;

fn open(path: &Path, options: Options) -> Queue {
    let store = Arc::new(Store::open(StoreConfig::new(path)).unwrap());
    Queue::open(store, "jobs", options).unwrap()
}

#[test]
fn test_ready_messages_and_counter_survive_restart() {
    let temp_dir = tempfile::tempdir().unwrap();

    {
        let queue = open(temp_dir.path(), Options::new());
        for body in ["a", "b", "c"] {
            queue.send(body).unwrap();
        }
        queue.close().unwrap();
    }

    let queue = open(temp_dir.path(), Options::new());
    assert_eq!(queue.len(Status::Ready).unwrap(), 3);
    // IDs keep counting from where the last process stopped
    assert_eq!(queue.send("d").unwrap().id(), &Id::from(4));

    let bodies: Vec<Vec<u8>> = std::iter::from_fn(|| queue.try_receive().ok())
        .map(|message| {
            message.ack().unwrap();
            message.into_body()
        })
        .collect();
    assert_eq!(
        bodies,
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]
    );
}

#[test]
fn test_restart_without_close() {
    let temp_dir = tempfile::tempdir().unwrap();

    {
        let queue = open(temp_dir.path(), Options::new());
        queue.send("unclosed").unwrap();
    }

    let queue = open(temp_dir.path(), Options::new());
    assert_eq!(queue.try_receive().unwrap().body(), b"unclosed");
}

#[test]
fn test_unacked_messages_stay_unacked_by_default() {
    let temp_dir = tempfile::tempdir().unwrap();

    {
        let queue = open(temp_dir.path(), Options::new());
        queue.send("in flight").unwrap();
        let _message = queue.try_receive().unwrap();
        queue.close().unwrap();
    }

    let queue = open(temp_dir.path(), Options::new());
    assert_eq!(queue.len(Status::Unacked).unwrap(), 1);
    assert!(matches!(queue.try_receive(), Err(Error::Empty)));
}

#[test]
fn test_unacked_recovery_restores_delivery_order() {
    let temp_dir = tempfile::tempdir().unwrap();

    {
        let queue = open(temp_dir.path(), Options::new().with_message_buffer_size(2));
        for body in ["a", "b", "c"] {
            queue.send(body).unwrap();
        }
        // Stages a and b; only a is handed out, b stays in the buffer
        let _a = queue.try_receive().unwrap();
        queue.close().unwrap();
    }

    let queue = open(temp_dir.path(), Options::new().with_unacked_recovery());
    assert_eq!(queue.len(Status::Unacked).unwrap(), 0);
    assert_eq!(queue.len(Status::Ready).unwrap(), 3);

    let ids: Vec<Id> = std::iter::from_fn(|| queue.try_receive().ok())
        .map(|message| message.id().clone())
        .collect();
    assert_eq!(ids, vec![Id::from(1), Id::from(2), Id::from(3)]);
}

#[test]
fn test_dead_letters_survive_restart() {
    let temp_dir = tempfile::tempdir().unwrap();

    {
        let queue = open(temp_dir.path(), Options::new().with_dead_letters());
        queue.send("poison").unwrap();
        queue.try_receive().unwrap().nack(false).unwrap();
        queue.close().unwrap();
    }

    let queue = open(temp_dir.path(), Options::new().with_dead_letters());
    assert_eq!(
        queue.dead_letters().unwrap(),
        vec![(Id::from(1), b"poison".to_vec())]
    );
    assert!(matches!(queue.try_receive(), Err(Error::Empty)));
}
