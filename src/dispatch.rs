//! Deferred DIO0 handling
//!
//! The DIO0 edge handler runs in whatever context the platform delivers
//! interrupts in, so it only enqueues an event. A single named worker thread
//! drains the queue in arrival order, locks the radio and services the edge;
//! application callbacks therefore always run on the worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::{debug, error, warn};

use crate::hal::EdgeHandler;
use crate::radio::Radio;
use crate::Error;

/// Name of the worker thread
pub const WORKER_NAME: &str = "sx1276-dio0";

/// Radio shared between the application and the worker
pub type SharedRadio<SPI, CS> = Arc<Mutex<Radio<SPI, CS>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Dio0Rise,
    Shutdown,
}

/// Owns the dispatch worker. Dropping it stops the worker.
pub struct Dispatcher {
    events: Sender<Event>,
    worker: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawns the worker for `radio`.
    ///
    /// # Errors
    /// * `Error::WorkerSpawn` - the thread could not be created
    pub fn start<SPI, CS>(radio: SharedRadio<SPI, CS>) -> Result<Self, Error>
    where
        SPI: SpiBus<u8> + Send + 'static,
        CS: OutputPin + Send + 'static,
    {
        let (events, queue) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || run(radio, queue))
            .map_err(|e| {
                error!("failed to spawn {}: {}", WORKER_NAME, e);
                Error::WorkerSpawn
            })?;

        debug!("dispatch worker started");
        Ok(Self {
            events,
            worker: Some(worker),
        })
    }

    /// Handler to install on the DIO0 line. It never blocks.
    pub fn edge_handler(&self) -> EdgeHandler {
        let events = self.events.clone();
        Box::new(move || {
            // Only fails once the worker is gone, when there is nobody to notify.
            let _ = events.send(Event::Dio0Rise);
        })
    }

    /// Stops the worker after the events already queued have been handled.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        let _ = self.events.send(Event::Shutdown);
        if worker.join().is_err() {
            error!("dispatch worker panicked");
        } else {
            debug!("dispatch worker stopped");
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<SPI, CS>(radio: SharedRadio<SPI, CS>, queue: Receiver<Event>)
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    for event in queue {
        match event {
            Event::Shutdown => break,
            Event::Dio0Rise => {
                let mut radio = radio.lock().unwrap_or_else(PoisonError::into_inner);
                match panic::catch_unwind(AssertUnwindSafe(|| radio.handle_dio0_rise())) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("DIO0 handling failed: {}", e),
                    Err(_) => warn!("callback panicked, its binding has been dropped"),
                }
            }
        }
    }
}
