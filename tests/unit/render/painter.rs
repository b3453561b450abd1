use super::*;
use std::time::Duration;

#[test]
fn request_before_wait_is_not_lost() {
    let signal = RepaintSignal::new();
    signal.request_repaint();
    signal.request_repaint();
    assert!(signal.wait());
}

#[test]
fn wait_wakes_on_request_from_other_thread() {
    let signal = Arc::new(RepaintSignal::new());
    let s = Arc::clone(&signal);
    let t = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        s.request_repaint();
    });
    assert!(signal.wait());
    t.join().unwrap();
}

#[test]
fn shutdown_wins_over_pending_request() {
    let signal = RepaintSignal::new();
    signal.request_repaint();
    signal.shutdown();
    assert!(!signal.wait());
    assert!(!signal.wait());
}
