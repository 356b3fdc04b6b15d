//! The background loop bridging the sensor connection to published recommendations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use cropsense_model::{DashboardRecord, Snapshot};

use crate::classifier::Recommender;
use crate::sensor::{parse_reading, SensorSourcePointer};
use crate::{IngestError, ParseError, SnapshotStore};

/// Cooperative stop flag shared by the ingest loop and whoever owns the process.
#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleeps for `duration`, waking early once shutdown is triggered.
    pub fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.is_triggered() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            std::thread::sleep(remaining.min(Self::POLL_INTERVAL));
        }
    }
}

/// What a single pass of the loop did.
#[derive(Debug, PartialEq)]
pub enum Step {
    /// Nothing complete arrived before the read timeout.
    Idle,
    /// The line was malformed and dropped.
    Skipped(ParseError),
    /// A new record was published.
    Published(Arc<Snapshot>),
}

pub struct IngestLoop {
    source: SensorSourcePointer,
    recommender: Recommender,
    store: SnapshotStore,
    shutdown: Shutdown,
    error_backoff: Duration,
}

impl IngestLoop {
    pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

    pub fn new(
        source: SensorSourcePointer,
        recommender: Recommender,
        store: SnapshotStore,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            source,
            recommender,
            store,
            shutdown,
            error_backoff: Self::DEFAULT_ERROR_BACKOFF,
        }
    }

    pub fn with_error_backoff(mut self, error_backoff: Duration) -> Self {
        self.error_backoff = error_backoff;
        self
    }

    /// Parses one line and, if it is a valid reading, publishes the record for it.
    pub fn process_line(&self, line: &str) -> Result<Step, IngestError> {
        let reading = match parse_reading(line) {
            Ok(reading) => reading,
            Err(e) => return Ok(Step::Skipped(e)),
        };

        let recommendation = self.recommender.recommend(&reading)?;
        let snapshot = self
            .store
            .publish(DashboardRecord::new(reading, recommendation));

        Ok(Step::Published(snapshot))
    }

    /// Reads at most one line and processes it.
    pub fn step(&mut self) -> Result<Step, IngestError> {
        match self.source.read_line()? {
            Some(line) => self.process_line(&line).inspect(|step| {
                if let Step::Skipped(reason) = step {
                    warn!("Ignoring sensor line {line:?}: {reason}");
                }
            }),
            None => Ok(Step::Idle),
        }
    }

    /// Runs until shutdown is triggered. Errors are logged and followed by the backoff pause;
    /// nothing here ends the loop except shutdown.
    pub fn run(mut self) {
        info!("Sensor ingest started");

        while !self.shutdown.is_triggered() {
            match self.step() {
                Ok(Step::Published(snapshot)) => {
                    let record = &snapshot.record;
                    debug!(
                        "Published #{}: {:.1}°C, {:.1}%, soil {:.1} -> crop {}, irrigation {}",
                        snapshot.sequence,
                        record.temp,
                        record.hum,
                        record.soil,
                        record.crop,
                        record.advice
                    );
                }
                Ok(Step::Idle | Step::Skipped(_)) => {}
                Err(e) => {
                    error!("Error reading from sensor: {e}");
                    self.shutdown.sleep(self.error_backoff);
                }
            }
        }

        info!("Sensor ingest stopped");
    }

    /// Runs the loop on its own thread. The serial port blocks, so it stays off the async runtime.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("sensor-ingest".into())
            .spawn(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, PredictionError};
    use crate::sensor::{LineSource, SensorSource};
    use cropsense_model::{Features, Recommendation, SensorReading};
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// Wheat/Yes when it is cool, Rice/No otherwise.
    struct Threshold {
        below: &'static str,
        above: &'static str,
    }

    impl Classifier for Threshold {
        fn predict(&self, features: &Features) -> Result<String, PredictionError> {
            let label = if features.0[0] < 28.0 { self.below } else { self.above };
            Ok(label.to_string())
        }
    }

    fn recommender() -> Recommender {
        Recommender::new(
            Box::new(Threshold {
                below: "Wheat",
                above: "Rice",
            }),
            Box::new(Threshold {
                below: "Yes",
                above: "No",
            }),
        )
    }

    fn ingest(input: &'static str) -> (IngestLoop, SnapshotStore) {
        let store = SnapshotStore::default();
        let source = Box::new(LineSource::new(Cursor::new(input)));
        let ingest = IngestLoop::new(source, recommender(), store.clone(), Shutdown::default());
        (ingest, store)
    }

    fn expected(temp: f64, hum: f64, soil: f64, crop: &str, advice: &str) -> DashboardRecord {
        DashboardRecord::new(
            SensorReading::new(temp, hum, soil),
            Recommendation {
                crop: crop.into(),
                advice: advice.into(),
            },
        )
    }

    #[test]
    fn valid_line_publishes_reading_and_predictions() {
        let (ingest, store) = ingest("");

        let step = ingest.process_line("25.0,60.0,40.0").unwrap();

        assert!(matches!(step, Step::Published(_)));
        assert_eq!(store.record(), expected(25.0, 60.0, 40.0, "Wheat", "Yes"));
    }

    #[test]
    fn malformed_lines_leave_record_unchanged() {
        let (ingest, store) = ingest("");
        ingest.process_line("31,80,70").unwrap();
        let before = store.get();

        for line in ["abc,60.0,40.0", "1,2", "1,2,3,4", ",,", "25;60;40"] {
            let step = ingest.process_line(line).unwrap();
            assert!(matches!(step, Step::Skipped(_)), "{line} was not skipped");
        }

        assert!(Arc::ptr_eq(&before, &store.get()));
        assert_eq!(store.record(), expected(31.0, 80.0, 70.0, "Rice", "No"));
    }

    #[test]
    fn same_line_twice_gives_same_record() {
        let (ingest, store) = ingest("");

        ingest.process_line("22.5,55,35").unwrap();
        let first = store.record();
        ingest.process_line("22.5,55,35").unwrap();

        assert_eq!(store.record(), first);
        assert_eq!(store.get().sequence, 2);
    }

    #[test]
    fn step_reads_from_source() {
        let (mut ingest, store) = ingest("abc,60.0,40.0\n\n25.0,60.0,40.0\n");

        assert_eq!(
            ingest.step().unwrap(),
            Step::Skipped(ParseError::NotANumber("abc".into()))
        );
        assert!(store.record().is_placeholder());
        assert_eq!(ingest.step().unwrap(), Step::Idle);
        assert!(matches!(ingest.step().unwrap(), Step::Published(_)));
        assert!(matches!(ingest.step(), Err(IngestError::Disconnected)));
        assert_eq!(store.record(), expected(25.0, 60.0, 40.0, "Wheat", "Yes"));
    }

    #[test]
    fn prediction_failure_is_an_error_and_keeps_record() {
        struct Broken;
        impl Classifier for Broken {
            fn predict(&self, _: &Features) -> Result<String, PredictionError> {
                Err("untrained".into())
            }
        }

        let store = SnapshotStore::default();
        let ingest = IngestLoop::new(
            Box::new(LineSource::new(Cursor::new(""))),
            Recommender::new(Box::new(Broken), Box::new(Broken)),
            store.clone(),
            Shutdown::default(),
        );

        assert!(matches!(
            ingest.process_line("25,60,40"),
            Err(IngestError::Prediction(_))
        ));
        assert!(store.record().is_placeholder());
    }

    /// Serves scripted lines, then triggers shutdown once it runs dry.
    struct Scripted {
        lines: VecDeque<Result<Option<String>, IngestError>>,
        shutdown: Shutdown,
    }

    impl SensorSource for Scripted {
        fn read_line(&mut self) -> Result<Option<String>, IngestError> {
            match self.lines.pop_front() {
                Some(line) => line,
                None => {
                    self.shutdown.trigger();
                    Ok(None)
                }
            }
        }
    }

    #[test]
    fn run_survives_errors_and_stops_on_shutdown() {
        let store = SnapshotStore::default();
        let shutdown = Shutdown::default();
        let source = Scripted {
            lines: VecDeque::from(vec![
                Ok(Some("abc,1,2".to_string())),
                Err(IngestError::Disconnected),
                Ok(Some("30,70,60".to_string())),
            ]),
            shutdown: shutdown.clone(),
        };

        let ingest = IngestLoop::new(Box::new(source), recommender(), store.clone(), shutdown)
            .with_error_backoff(Duration::from_millis(10));
        ingest.spawn().unwrap().join().unwrap();

        assert_eq!(store.record(), expected(30.0, 70.0, 60.0, "Rice", "No"));
    }

    #[test]
    fn sleep_wakes_on_shutdown() {
        let shutdown = Shutdown::default();
        shutdown.trigger();

        let started = Instant::now();
        shutdown.sleep(Duration::from_secs(5));

        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
