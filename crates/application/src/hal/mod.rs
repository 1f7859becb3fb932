//! Plant HAL: owns the buses, the device drivers and the live tag table,
//! and runs the poll and write-dispatch loops.

mod dispatcher;
mod poller;
mod tag_store;

pub use dispatcher::DispatchOutcome;
pub use poller::PollReport;
pub use tag_store::TagStore;

use std::collections::HashMap;
use std::sync::Arc;

use domain::DomainError;
use domain::HalEvent;
use domain::bus::ClientFactory;
use domain::device::FieldDevice;
use domain::event::EventPublisher;
use domain::tag::{Snapshot, TagDefinition, TagValue, WriteCommand};
use infrastructure::{
    DeviceFactory, HalSettings, ModbusBus, PlantConfig, RtuClientFactory, TracingEventPublisher,
};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// State shared by both workers
pub(crate) struct HalContext {
    pub(crate) tags: Vec<TagDefinition>,
    index: HashMap<String, usize>,
    pub(crate) devices: HashMap<String, Arc<dyn FieldDevice>>,
    pub(crate) store: TagStore,
    pub(crate) health_tag: Option<String>,
    publisher: Arc<dyn EventPublisher>,
}

impl HalContext {
    pub(crate) fn tag(&self, name: &str) -> Option<&TagDefinition> {
        self.index.get(name).map(|&i| &self.tags[i])
    }

    /// Fire-and-forget telemetry
    pub(crate) async fn emit(&self, event: HalEvent) {
        if let Err(e) = self.publisher.publish(event).await {
            debug!(error = %e, "Failed to publish HAL event");
        }
    }
}

enum Lifecycle {
    Idle(mpsc::UnboundedReceiver<WriteCommand>),
    Running {
        poller: JoinHandle<()>,
        dispatcher: JoinHandle<()>,
    },
    Stopped,
}

impl Lifecycle {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Idle(_) => "idle",
            Self::Running { .. } => "running",
            Self::Stopped => "stopped",
        }
    }
}

pub struct Hal {
    context: Arc<HalContext>,
    buses: Vec<Arc<ModbusBus>>,
    settings: HalSettings,
    commands: mpsc::UnboundedSender<WriteCommand>,
    lifecycle: Mutex<Lifecycle>,
    cancel: CancellationToken,
}

impl Hal {
    /// Build buses, devices and tags from `config`.
    ///
    /// Every configuration mistake surfaces here; a HAL that constructs
    /// successfully never fails at runtime, it only degrades tag quality.
    pub fn new(
        config: &PlantConfig,
        clients: &dyn ClientFactory,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, DomainError> {
        config.validate()?;

        let buses: Vec<Arc<ModbusBus>> = config
            .buses
            .iter()
            .map(|bus| Arc::new(ModbusBus::from_factory(&bus.name, bus.spec.clone(), clients)))
            .collect();
        let by_name: HashMap<String, Arc<ModbusBus>> = buses
            .iter()
            .map(|bus| (bus.name().to_string(), bus.clone()))
            .collect();

        let devices = DeviceFactory::create_all(&config.devices, &by_name)?;

        let tags = config.tag_definitions();
        for tag in &tags {
            if let Some(device) = tag.device() {
                if !devices.contains_key(device) {
                    return Err(DomainError::UnknownDevice {
                        tag: tag.name.clone(),
                        device: device.to_string(),
                    });
                }
            }
        }
        let index = tags
            .iter()
            .enumerate()
            .map(|(i, tag)| (tag.name.clone(), i))
            .collect();

        let health_tag = config.settings.health_tag.clone().filter(|name| {
            let declared = tags.iter().any(|tag| &tag.name == name);
            if !declared {
                debug!(tag = %name, "Health tag not declared, not maintained");
            }
            declared
        });

        let (commands, pending) = mpsc::unbounded_channel();

        info!(
            buses = buses.len(),
            devices = devices.len(),
            tags = tags.len(),
            "HAL configured"
        );

        Ok(Self {
            context: Arc::new(HalContext {
                tags,
                index,
                devices,
                store: TagStore::new(),
                health_tag,
                publisher,
            }),
            buses,
            settings: config.settings.clone(),
            commands,
            lifecycle: Mutex::new(Lifecycle::Idle(pending)),
            cancel: CancellationToken::new(),
        })
    }

    /// HAL on real serial ports, reporting events to the log
    pub fn from_config(config: &PlantConfig) -> Result<Self, DomainError> {
        Self::new(config, &RtuClientFactory, Arc::new(TracingEventPublisher::new()))
    }

    pub fn settings(&self) -> &HalSettings {
        &self.settings
    }

    /// Configured tag names in configuration order
    pub fn tag_names(&self) -> Vec<String> {
        self.context.tags.iter().map(|t| t.name.clone()).collect()
    }

    /// Open every bus, then launch the poll and dispatch loops.
    pub async fn start(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if !matches!(*lifecycle, Lifecycle::Idle(_)) {
            warn!(state = lifecycle.as_str(), "HAL start ignored");
            return;
        }
        let Lifecycle::Idle(pending) = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) else {
            return;
        };

        for bus in &self.buses {
            let connected = bus.open().await;
            self.context
                .emit(HalEvent::bus_opened(bus.name(), &bus.spec().port, connected))
                .await;
        }

        let poller = tokio::spawn(poller::run(
            self.context.clone(),
            self.settings.poll_period(),
            self.cancel.child_token(),
        ));
        let dispatcher = tokio::spawn(dispatcher::run(
            self.context.clone(),
            pending,
            self.settings.write_wait(),
            self.cancel.child_token(),
        ));

        *lifecycle = Lifecycle::Running { poller, dispatcher };
        info!("HAL started");
    }

    /// Signal both loops, join them, then close every bus. Returns within
    /// the join timeout; the last quarter of it is kept for closing buses.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let (poller, dispatcher) = match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running { poller, dispatcher } => (poller, dispatcher),
            Lifecycle::Idle(_) => {
                info!("HAL stopped before it was started");
                return;
            }
            Lifecycle::Stopped => {
                warn!("HAL already stopped");
                return;
            }
        };

        self.cancel.cancel();
        let join_timeout = self.settings.join_timeout();
        let deadline = Instant::now() + join_timeout;
        let join_deadline = deadline - join_timeout / 4;
        join_within("poll", poller, join_deadline).await;
        join_within("dispatch", dispatcher, join_deadline).await;

        for bus in &self.buses {
            if timeout_at(deadline, bus.close()).await.is_err() {
                warn!(bus = %bus.name(), "Bus close abandoned at stop deadline");
            }
            self.context.emit(HalEvent::bus_closed(bus.name())).await;
        }
        info!("HAL stopped");
    }

    /// Consistent copy of the whole tag table
    pub fn snapshot(&self) -> Snapshot {
        self.context.store.snapshot()
    }

    /// Latest value of one tag, if anything has been recorded for it
    pub fn value(&self, tag: &str) -> Option<TagValue> {
        self.context.store.get(tag)
    }

    /// Queue a write and return immediately; the outcome shows up in
    /// [`Hal::snapshot`] once the dispatch loop has handled it.
    pub fn write(&self, tag: &str, value: f64) {
        if self.commands.send(WriteCommand::new(tag, value)).is_err() {
            debug!(tag = %tag, value, "Write discarded, dispatch loop is gone");
        }
    }
}

impl Drop for Hal {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn join_within(worker: &str, mut handle: JoinHandle<()>, deadline: Instant) {
    match timeout_at(deadline, &mut handle).await {
        Ok(Ok(())) => debug!(worker, "Worker joined"),
        Ok(Err(e)) => warn!(worker, error = %e, "Worker ended abnormally"),
        Err(_) => {
            warn!(worker, "Worker did not stop in time, aborting");
            handle.abort();
        }
    }
}
