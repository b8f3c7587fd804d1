//! A session shared between threads keeps its registry consistent.

mod common;

use common::fast_port;
use serial_session::service::SerialSession;
use std::thread;

#[test]
fn concurrent_add_and_delete_keep_current_valid() {
    let shared = SerialSession::new().into_shared();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let locator = format!("loop://w{worker}-{i}");
                    let mut session = shared.lock();
                    session.add_port(&locator, fast_port()).unwrap();
                    if i % 2 == 0 {
                        session.delete_port(Some(&locator)).unwrap();
                    }
                    let current = session.current_port_locator().map(str::to_string);
                    assert_eq!(current.is_none(), session.registry().is_empty());
                    if let Some(current) = current {
                        assert!(session.registry().contains(&current));
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let mut session = shared.lock();
    assert_eq!(session.registry().len(), 4 * 12);
    session.delete_all_ports();
    assert!(session.current_port_locator().is_none());
}

#[test]
fn writes_and_reads_interleave_per_port() {
    let shared = SerialSession::new().into_shared();
    {
        let mut session = shared.lock();
        for worker in 0..3 {
            session
                .add_port(&format!("loop://{worker}"), fast_port())
                .unwrap();
        }
    }

    let workers: Vec<_> = (0..3u8)
        .map(|worker| {
            let shared = shared.clone();
            thread::spawn(move || {
                let locator = format!("loop://{worker}");
                for _ in 0..20 {
                    let mut session = shared.lock();
                    session
                        .write_bytes(&[worker, 0x0A], Some(&locator))
                        .unwrap();
                    let line = session.read_until(None, None, None, Some(&locator)).unwrap();
                    assert_eq!(line, format!("{worker:02X} 0A"));
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}
