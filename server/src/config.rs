use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use cropsense_common::classifier::TrainingOptions;
use cropsense_common::ingest::IngestLoop;
use cropsense_common::sensor::SerialConfig;

/// Everything the dashboard needs to start.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    pub serial: SerialConfig,
    pub dataset: PathBuf,
    pub training: TrainingOptions,
    pub bind: SocketAddr,
    /// Pause after a sensor read error before trying again.
    pub error_backoff: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            dataset: PathBuf::from("data/realistic_crop_irrigation_dataset.csv"),
            training: TrainingOptions::default(),
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            error_backoff: IngestLoop::DEFAULT_ERROR_BACKOFF,
        }
    }
}

/// Live crop and irrigation recommendations from a serial soil sensor.
#[derive(Parser, Debug)]
#[command(name = "cropsense")]
#[command(version)]
#[command(about = "Live crop and irrigation recommendations from a serial soil sensor")]
pub struct Cli {
    /// Serial device the microcontroller is attached to
    #[arg(long, env = "CROPSENSE_SERIAL_PORT")]
    pub serial_port: Option<String>,

    /// Serial baud rate
    #[arg(long, env = "CROPSENSE_BAUD_RATE")]
    pub baud_rate: Option<u32>,

    /// CSV dataset the models are trained on
    #[arg(long, env = "CROPSENSE_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Address the web server binds to
    #[arg(long, env = "CROPSENSE_BIND")]
    pub bind: Option<SocketAddr>,

    /// Trees per random forest
    #[arg(long, env = "CROPSENSE_TREES")]
    pub trees: Option<u16>,
}

impl Cli {
    /// Overlays the given arguments on the defaults.
    pub fn into_config(self) -> DashboardConfig {
        let mut config = DashboardConfig::default();

        if let Some(serial_port) = self.serial_port {
            config.serial.path = serial_port;
        }
        if let Some(baud_rate) = self.baud_rate {
            config.serial.baud_rate = baud_rate;
        }
        if let Some(dataset) = self.dataset {
            config.dataset = dataset;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(trees) = self.trees {
            config.training.n_trees = trees;
        }

        config
    }
}
