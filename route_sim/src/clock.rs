use std::time::Duration;

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};

use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockId(pub u64);

/// Periodic tick source. Sends `Event::Tick(id)` every `period`, first tick one
/// period after spawning.
///
/// Dropping the clock aborts its task. Ticks that were already queued still
/// carry the old id, so receivers must compare ids.
#[derive(Debug)]
pub struct Clock {
    id: ClockId,
    task: JoinHandle<()>,
}

impl Clock {
    pub fn spawn(id: ClockId, period: Duration, events: UnboundedSender<Event>) -> Self {
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if events.send(Event::Tick(id)).is_err() {
                    // Session is gone
                    break;
                }
            }
        });

        Self { id, task }
    }

    pub fn id(&self) -> ClockId {
        self.id
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use tokio::{sync::mpsc, time::timeout};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_with_its_id_until_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let clock = Clock::spawn(ClockId(7), Duration::from_millis(120), tx.clone());

        for n in 1..=3u32 {
            let Some(Event::Tick(id)) = rx.recv().await else {
                panic!("expected a tick");
            };
            assert_eq!(id, ClockId(7));
            assert_eq!(Instant::now() - start, Duration::from_millis(120) * n);
        }

        drop(clock);

        // tx keeps the channel open, so silence means the task is gone
        assert!(timeout(Duration::from_secs(5), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_receiver_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let clock = Clock::spawn(ClockId(1), Duration::from_millis(10), tx);
        drop(rx);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(clock.task.is_finished());
    }
}
