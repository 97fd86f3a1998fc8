//! Sample channel between the polling loop and the live view.
//!
//! Uses std::sync::mpsc for single-producer, single-consumer communication.
//! The polling thread sends filtered samples; the viewer drains them each repaint.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use crate::telemetry::Sample;

/// Creates a new sample queue.
///
/// The channel is unbounded - samples queue up if the viewer repaints slower
/// than frames are processed.
pub fn create_sample_queue() -> (Sender<Sample>, Receiver<Sample>) {
    channel()
}

/// Takes every sample currently queued without blocking.
///
/// The flag is `true` once the sender is gone and the queue is empty,
/// i.e. the polling loop has finished.
pub fn drain_samples(receiver: &Receiver<Sample>) -> (Vec<Sample>, bool) {
    let mut samples = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(sample) => samples.push(sample),
            Err(TryRecvError::Empty) => return (samples, false),
            Err(TryRecvError::Disconnected) => return (samples, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64) -> Sample {
        Sample {
            rocket: "H3".to_string(),
            time,
            stages: vec![],
        }
    }

    #[test]
    fn test_drain_returns_queued_samples_in_order() {
        let (sender, receiver) = create_sample_queue();
        for i in 0..3 {
            sender.send(sample(i as f64)).unwrap();
        }

        let (samples, finished) = drain_samples(&receiver);
        assert!(!finished);
        let times: Vec<f64> = samples.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_drain_reports_finished_after_sender_dropped() {
        let (sender, receiver) = create_sample_queue();
        sender.send(sample(1.0)).unwrap();
        drop(sender);

        let (samples, finished) = drain_samples(&receiver);
        assert_eq!(samples.len(), 1);
        assert!(finished);
    }
}
