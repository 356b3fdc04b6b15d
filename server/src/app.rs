use log::{error, info, warn};

use cropsense_common::classifier::train_from_path;
use cropsense_common::ingest::{IngestLoop, Shutdown};
use cropsense_common::sensor::open_serial;
use cropsense_common::{SnapshotStore, StartupError};

use crate::config::DashboardConfig;
use crate::routes::{self, AppState};

/// Our App struct that holds the trained models, the shared record and the sensor loop.
///
/// Construction does all the fallible startup work: training is fatal when it fails, a missing
/// serial port only means the dashboard keeps showing placeholder data.
pub struct App {
    config: DashboardConfig,
    store: SnapshotStore,
    shutdown: Shutdown,
    ingest: Option<IngestLoop>,
}

impl App {
    pub fn new(config: DashboardConfig) -> Result<Self, StartupError> {
        // Train both models, a failure here is fatal
        let recommender = train_from_path(&config.dataset, config.training)?;

        // The shared record starts out as the placeholder
        let store = SnapshotStore::default();
        let shutdown = Shutdown::default();

        // Open the serial port, or keep serving placeholder data without it
        let ingest = match open_serial(&config.serial) {
            Ok(source) => Some(
                IngestLoop::new(Box::new(source), recommender, store.clone(), shutdown.clone())
                    .with_error_backoff(config.error_backoff),
            ),
            Err(e) => {
                warn!(
                    "Cannot open serial port {}: {e}. Serving placeholder data only.",
                    config.serial.path
                );
                None
            }
        };

        Ok(Self {
            config,
            store,
            shutdown,
            ingest,
        })
    }

    pub fn sensor_connected(&self) -> bool {
        self.ingest.is_some()
    }

    /// Starts the sensor loop and serves HTTP until Ctrl-C, then stops the loop.
    pub async fn run(self) -> anyhow::Result<()> {
        // Start the sensor loop on its own thread
        let worker = self.ingest.map(IngestLoop::spawn).transpose()?;
        let state = AppState::new(self.store, worker.is_some());

        // Bind the HTTP listener
        let listener = tokio::net::TcpListener::bind(self.config.bind).await?;
        info!("Dashboard listening on http://{}", listener.local_addr()?);

        // Serve the dashboard until Ctrl-C
        axum::serve(listener, routes::router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // Stop the sensor loop and wait for it
        self.shutdown.trigger();
        if let Some(worker) = worker {
            // The loop notices the flag after its current read times out.
            let joined = tokio::task::spawn_blocking(move || worker.join()).await?;
            if joined.is_err() {
                error!("Sensor ingest thread panicked");
            }
        }

        info!("Dashboard stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            error!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
