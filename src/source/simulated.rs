//! Simulated data for when the backend is unreachable.
//!
//! Every tick draws an independent sample: there is no phase-transition
//! modelling, only plausible numbers. The dynamic green duration is still
//! derived with the same policy as live mode so the two stay comparable.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::channel::PollingChannel;
use super::{DataSource, SourceView};
use crate::data::{
    CongestionSnapshot, HistoryEntry, HistoryResponse, OperatingMode, SignalPhase, SignalState,
    ZoneCounts, GRID_CELLS,
};
use crate::policy::{self, SignalTiming};

/// Samples kept for the simulated trend view; the backend keeps the same window.
pub const HISTORY_WINDOW: usize = 50;

/// One generated tick: signal, congestion and the rolling history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatedFrame {
    pub signal: SignalState,
    pub congestion: CongestionSnapshot,
    pub history: HistoryResponse,
}

#[derive(Debug)]
struct Sampler {
    rng: ChaCha8Rng,
    timing: SignalTiming,
    history: VecDeque<HistoryEntry>,
}

impl Sampler {
    fn new(timing: SignalTiming, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            timing,
            history: VecDeque::with_capacity(HISTORY_WINDOW),
        }
    }

    fn sample(&mut self) -> SimulatedFrame {
        let counts = ZoneCounts::new(
            self.rng.gen_range(1..=8),
            self.rng.gen_range(3..=12),
            self.rng.gen_range(2..=13),
        );
        let mut congestion =
            CongestionSnapshot::from_counts(counts, self.rng.gen_range(0..=GRID_CELLS));
        let now = Local::now().naive_local();
        congestion.timestamp = Some(now);

        let phase = SignalPhase::ALL[self.rng.gen_range(0..SignalPhase::ALL.len())];
        let time_remaining = self.rng.gen_range(10..70);
        let signal = SignalState {
            phase,
            time_remaining,
            configured_duration: self.timing.duration_for(phase, &congestion).max(time_remaining),
            dynamic_green_duration: policy::dynamic_green_duration(&congestion),
            timestamp: Some(now),
        };

        if self.history.len() == HISTORY_WINDOW {
            self.history.pop_front();
        }
        self.history.push_back(HistoryEntry {
            timestamp: now,
            zone_counts: counts,
            total_vehicles: congestion.total_vehicles,
            signal_status: phase,
        });

        SimulatedFrame {
            signal,
            congestion,
            history: HistoryResponse {
                history: self.history.iter().cloned().collect(),
                total_entries: Some(self.history.len()),
            },
        }
    }
}

/// Pseudo-random stand-in for the live backend.
///
/// Runs on its own timer through a [`PollingChannel`] whose read never
/// fails and never touches the network.
#[derive(Debug)]
pub struct SimulatedStateGenerator {
    channel: PollingChannel<SimulatedFrame>,
    sampler: Arc<Mutex<Sampler>>,
    description: String,
}

impl SimulatedStateGenerator {
    /// `seed` makes the sample sequence reproducible; `None` seeds from the OS.
    pub fn new(interval: Duration, timing: SignalTiming, seed: Option<u64>) -> Self {
        let sampler = Arc::new(Mutex::new(Sampler::new(timing, seed)));
        let channel = {
            let sampler = sampler.clone();
            PollingChannel::new("simulated", interval, interval, SimulatedFrame::default(), move || {
                let frame = sampler.lock().sample();
                async move { Ok(frame) }
            })
        };
        let description = match seed {
            Some(seed) => format!("simulated (seed {})", seed),
            None => "simulated".to_string(),
        };
        Self {
            channel,
            sampler,
            description,
        }
    }

}

impl DataSource for SimulatedStateGenerator {
    fn start(&mut self) {
        if self.channel.is_running() {
            return;
        }
        self.sampler.lock().history.clear();
        debug!("starting simulated data");
        self.channel.start();
    }

    fn stop(&mut self) {
        self.channel.stop();
    }

    fn is_active(&self) -> bool {
        self.channel.is_running()
    }

    fn view(&self) -> SourceView {
        let state = self.channel.state();
        SourceView {
            signal: state.map(|frame| frame.signal.clone()),
            congestion: state.map(|frame| frame.congestion.clone()),
            history: state.map(|frame| frame.history.clone()),
        }
    }

    fn mode(&self) -> OperatingMode {
        OperatingMode::Simulated
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Validate;
    use std::collections::HashSet;

    #[test]
    fn test_samples_within_ranges() {
        let mut sampler = Sampler::new(SignalTiming::default(), Some(42));
        for _ in 0..500 {
            let frame = sampler.sample();
            let counts = frame.congestion.zone_counts;
            assert!((1..=8).contains(&counts.green));
            assert!((3..=12).contains(&counts.yellow));
            assert!((2..=13).contains(&counts.red));
            assert!((10..70).contains(&frame.signal.time_remaining));
            assert!(frame.congestion.validate().is_ok());
            assert!(frame.signal.validate().is_ok());
            assert!(frame.history.validate().is_ok());
        }
    }

    #[test]
    fn test_green_duration_follows_policy() {
        let mut sampler = Sampler::new(SignalTiming::default(), Some(7));
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let frame = sampler.sample();
            let expected = policy::dynamic_green_duration(&frame.congestion);
            assert_eq!(frame.signal.dynamic_green_duration, expected);
            seen.insert(expected);
        }
        assert_eq!(
            seen,
            HashSet::from([
                policy::BASE_GREEN_SECS,
                policy::MODERATE_GREEN_SECS,
                policy::HEAVY_GREEN_SECS
            ])
        );
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Sampler::new(SignalTiming::default(), Some(99));
        let mut b = Sampler::new(SignalTiming::default(), Some(99));
        for _ in 0..20 {
            let (fa, fb) = (a.sample(), b.sample());
            assert_eq!(fa.congestion.zone_counts, fb.congestion.zone_counts);
            assert_eq!(fa.signal.phase, fb.signal.phase);
            assert_eq!(fa.signal.time_remaining, fb.signal.time_remaining);
        }
    }

    #[test]
    fn test_history_window_is_bounded() {
        let mut sampler = Sampler::new(SignalTiming::default(), Some(1));
        let mut last = SimulatedFrame::default();
        for _ in 0..(HISTORY_WINDOW + 20) {
            last = sampler.sample();
        }
        assert_eq!(last.history.history.len(), HISTORY_WINDOW);
        assert_eq!(last.history.total_entries, Some(HISTORY_WINDOW));
        let newest = last.history.history.last().unwrap();
        assert_eq!(newest.zone_counts, last.congestion.zone_counts);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generator_ticks_every_interval() {
        let interval = Duration::from_secs(3);
        let mut generator = SimulatedStateGenerator::new(interval, SignalTiming::default(), Some(5));
        assert!(generator.view().signal.loading);

        generator.start();
        tokio::time::sleep(Duration::from_millis(1)).await;
        let first = generator.view();
        assert!(!first.signal.loading);
        assert_eq!(first.history.latest.history.len(), 1);

        tokio::time::sleep(interval * 3).await;
        let view = generator.view();
        assert_eq!(view.history.latest.history.len(), 4);
        assert_eq!(
            view.congestion.latest.total_vehicles,
            view.congestion.latest.zone_counts.total()
        );

        generator.stop();
        generator.start();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(generator.view().history.latest.history.len(), 1);
        assert_eq!(generator.description(), "simulated (seed 5)");
    }
}
