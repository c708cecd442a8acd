use super::clock::Clock;
use super::tick::Tick;
use crate::communication::{Outputs, Publisher, PublisherConfig, Subscriber, SubscriberConfig};
use crate::config::load_config;
use crate::error::{RingbusError, RingbusResult};
use crate::memory::SubscriberMode;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

type InitFn<C, S> = Box<dyn FnOnce(&C) -> S + Send>;
type UpdateFn<C, S> = Box<dyn FnMut(&C, &mut S) -> Tick + Send>;

/// Lifecycle of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentStatus {
    /// Channels may still be registered; `run` has not been called
    Constructed,
    /// The scheduling thread is alive
    Running,
    /// The loop has ended, either through `stop` or an update returning `false`
    Stopped,
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentStatus::Constructed => write!(f, "Constructed"),
            ComponentStatus::Running => write!(f, "Running"),
            ComponentStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Lock-free counters for one component loop
#[derive(Debug, Default)]
#[repr(align(64))]
struct AtomicComponentMetrics {
    ticks: AtomicU64,
    overruns: AtomicU64,
    unregistered_outputs: AtomicU64,
    publish_errors: AtomicU64,
    spin_errors: AtomicU64,
}

impl AtomicComponentMetrics {
    fn snapshot(&self) -> ComponentMetrics {
        ComponentMetrics {
            ticks: self.ticks.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            unregistered_outputs: self.unregistered_outputs.load(Ordering::Relaxed),
            publish_errors: self.publish_errors.load(Ordering::Relaxed),
            spin_errors: self.spin_errors.load(Ordering::Relaxed),
        }
    }
}

/// Component counters at one point in time.
///
/// `overruns` counts ticks whose work took longer than the period; such ticks
/// start the next one immediately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentMetrics {
    pub ticks: u64,
    pub overruns: u64,
    pub unregistered_outputs: u64,
    pub publish_errors: u64,
    pub spin_errors: u64,
}

#[derive(Default)]
struct ChannelSet {
    publishers: HashMap<String, Publisher>,
    subscribers: Vec<Subscriber>,
}

/// Requests a component stop from another thread or a signal handler
#[derive(Debug, Clone)]
pub struct StopHandle {
    exit_requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.exit_requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.exit_requested.load(Ordering::Acquire)
    }
}

/// Runs a user update function at a fixed frequency on one background thread.
///
/// Each tick calls `update` with the config and state under the state lock,
/// publishes the returned outputs to the registered publishers, then spins
/// every subscriber once in registration order and sleeps out the rest of
/// the period.
///
/// # Example
///
/// ```rust,ignore
/// let mut counter = Component::new("counter", (), |_| 0u32, |_, count| {
///     *count += 1;
///     Tick::continue_if(*count < 10).with_pod_output("/count", &*count)
/// });
/// counter.create_publisher("/count", 16, 4)?;
/// counter.run(10.0)?;
/// counter.join()?;
/// ```
///
/// Dropping a component joins its thread without requesting a stop; call
/// [`Component::stop`] first unless the update function ends the loop itself.
pub struct Component<C, S> {
    name: String,
    config: Arc<C>,
    state: Arc<Mutex<Option<S>>>,
    init: Option<InitFn<C, S>>,
    update: Option<UpdateFn<C, S>>,
    channels: Option<ChannelSet>,
    exit_requested: Arc<AtomicBool>,
    metrics: Arc<AtomicComponentMetrics>,
    handle: Option<JoinHandle<ChannelSet>>,
    started: bool,
}

impl<C, S> std::fmt::Debug for Component<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("started", &self.started)
            .field("exit_requested", &self.exit_requested.load(Ordering::Relaxed))
            .field("metrics", &self.metrics.snapshot())
            .finish_non_exhaustive()
    }
}

impl<C, S> Component<C, S>
where
    C: Send + Sync + 'static,
    S: Send + 'static,
{
    pub fn new<I, U>(name: impl Into<String>, config: C, init: I, update: U) -> Self
    where
        I: FnOnce(&C) -> S + Send + 'static,
        U: FnMut(&C, &mut S) -> Tick + Send + 'static,
    {
        Self {
            name: name.into(),
            config: Arc::new(config),
            state: Arc::new(Mutex::new(None)),
            init: Some(Box::new(init)),
            update: Some(Box::new(update)),
            channels: Some(ChannelSet::default()),
            exit_requested: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(AtomicComponentMetrics::default()),
            handle: None,
            started: false,
        }
    }

    /// Build a component whose config is read once from a TOML, YAML or JSON file
    pub fn from_config_file<P, I, U>(
        name: impl Into<String>,
        path: P,
        init: I,
        update: U,
    ) -> RingbusResult<Self>
    where
        C: DeserializeOwned,
        P: AsRef<Path>,
        I: FnOnce(&C) -> S + Send + 'static,
        U: FnMut(&C, &mut S) -> Tick + Send + 'static,
    {
        let config = load_config(path)?;
        Ok(Self::new(name, config, init, update))
    }

    fn registry(&mut self) -> RingbusResult<&mut ChannelSet> {
        if self.started {
            return Err(RingbusError::component(format!(
                "component '{}' has already been run; register channels before run()",
                self.name
            )));
        }
        let name = &self.name;
        self.channels.as_mut().ok_or_else(|| {
            RingbusError::component(format!("component '{}' has no channel registry", name))
        })
    }

    /// Register an existing publisher under its topic
    pub fn add_publisher(&mut self, publisher: Publisher) -> RingbusResult<()> {
        let name = self.name.clone();
        let registry = self.registry()?;
        let topic = publisher.topic().to_string();
        if registry.publishers.contains_key(&topic) {
            return Err(RingbusError::invalid_argument(format!(
                "component '{}' already publishes to '{}'",
                name, topic
            )));
        }
        log::debug!("Component '{}': registered publisher '{}'", name, topic);
        registry.publishers.insert(topic, publisher);
        Ok(())
    }

    pub fn create_publisher(
        &mut self,
        topic: &str,
        capacity: usize,
        message_length: usize,
    ) -> RingbusResult<()> {
        self.registry()?;
        let publisher = Publisher::new(topic, capacity, message_length)?;
        self.add_publisher(publisher)
    }

    /// Create every publisher listed in a config, stopping at the first failure
    pub fn create_publishers(&mut self, configs: &[PublisherConfig]) -> RingbusResult<()> {
        for config in configs {
            self.registry()?;
            config.validate()?;
            let publisher = config.build()?;
            self.add_publisher(publisher)?;
        }
        Ok(())
    }

    /// Register an existing subscriber; subscribers are spun in registration order
    pub fn add_subscriber(&mut self, subscriber: Subscriber) -> RingbusResult<()> {
        let name = self.name.clone();
        let registry = self.registry()?;
        log::debug!(
            "Component '{}': registered subscriber '{}' ({})",
            name,
            subscriber.topic(),
            subscriber.mode()
        );
        registry.subscribers.push(subscriber);
        Ok(())
    }

    pub fn create_subscriber<F>(
        &mut self,
        topic: &str,
        mode: SubscriberMode,
        message_length: usize,
        callback: F,
    ) -> RingbusResult<()>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        self.registry()?;
        let subscriber = Subscriber::new(topic, mode, message_length, callback)?;
        self.add_subscriber(subscriber)
    }

    pub fn create_subscriber_from<F>(
        &mut self,
        config: &SubscriberConfig,
        callback: F,
    ) -> RingbusResult<()>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        self.registry()?;
        let subscriber = config.build(callback)?;
        self.add_subscriber(subscriber)
    }

    /// Call init, then start the loop at `frequency_hz` on a background thread.
    ///
    /// May be called once. Init runs on the calling thread before the loop
    /// starts; the loop ends when an update returns `keep_running == false` or
    /// [`Component::stop`] is called.
    pub fn run(&mut self, frequency_hz: f64) -> RingbusResult<()> {
        if self.started {
            return Err(RingbusError::component(format!(
                "component '{}' can only be run once",
                self.name
            )));
        }
        let period = period_for(frequency_hz)?;

        let (Some(init), Some(update), Some(channels)) =
            (self.init.take(), self.update.take(), self.channels.take())
        else {
            return Err(RingbusError::component(format!(
                "component '{}' is missing its init or update function",
                self.name
            )));
        };
        self.started = true;

        let initial = init(&*self.config);
        *self.state.lock() = Some(initial);
        log::info!(
            "Component '{}' initialized ({} publishers, {} subscribers, {:.1} Hz)",
            self.name,
            channels.publishers.len(),
            channels.subscribers.len(),
            frequency_hz
        );

        let worker = Worker {
            name: self.name.clone(),
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
            update,
            channels,
            period,
            exit_requested: Arc::clone(&self.exit_requested),
            metrics: Arc::clone(&self.metrics),
        };

        let handle = std::thread::Builder::new()
            .name(format!("ringbus-{}", self.name.replace('\0', "")))
            .spawn(move || worker.run())
            .map_err(|e| {
                RingbusError::component(format!(
                    "failed to spawn scheduling thread for '{}': {}",
                    self.name, e
                ))
            })?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Ask the loop to end once the tick in flight, pacing sleep included, is
    /// done. Calling again has no effect.
    pub fn stop(&self) {
        if !self.exit_requested.swap(true, Ordering::AcqRel) {
            log::info!("Stop requested for component '{}'", self.name);
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            exit_requested: Arc::clone(&self.exit_requested),
        }
    }

    /// Wait for the scheduling thread to finish.
    ///
    /// Returns immediately if the component never ran or was already joined.
    pub fn join(&mut self) -> RingbusResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(channels) => {
                self.channels = Some(channels);
                Ok(())
            }
            Err(_) => Err(RingbusError::component(format!(
                "scheduling thread of component '{}' panicked",
                self.name
            ))),
        }
    }

    pub fn status(&self) -> ComponentStatus {
        if !self.started {
            return ComponentStatus::Constructed;
        }
        match &self.handle {
            Some(handle) if !handle.is_finished() => ComponentStatus::Running,
            _ => ComponentStatus::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status() == ComponentStatus::Running
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Run `f` against the config and state under the state lock.
    ///
    /// Returns `None` before `run` has initialized the state. While the loop
    /// is running this waits for the tick in flight to release the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&C, &mut S) -> R) -> Option<R> {
        let mut guard = self.state.lock();
        guard.as_mut().map(|state| f(&*self.config, state))
    }

    pub fn metrics(&self) -> ComponentMetrics {
        self.metrics.snapshot()
    }

    /// Topics with a registered publisher; empty while the loop owns the channels
    pub fn publisher_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .channels
            .as_ref()
            .map(|c| c.publishers.keys().cloned().collect())
            .unwrap_or_default();
        topics.sort();
        topics
    }

    /// Registered publisher for `topic`, unless the loop currently owns the channels
    pub fn publisher(&self, topic: &str) -> Option<&Publisher> {
        self.channels.as_ref()?.publishers.get(topic)
    }

    pub fn subscriber_count(&self) -> usize {
        self.channels
            .as_ref()
            .map(|c| c.subscribers.len())
            .unwrap_or_default()
    }
}

impl<C, S> Drop for Component<C, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Scheduling thread of component '{}' panicked", self.name);
            }
        }
    }
}

fn period_for(frequency_hz: f64) -> RingbusResult<Duration> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return Err(RingbusError::invalid_argument(format!(
            "frequency must be a positive number of Hz, got {}",
            frequency_hz
        )));
    }
    Duration::try_from_secs_f64(1.0 / frequency_hz).map_err(|_| {
        RingbusError::invalid_argument(format!(
            "frequency {} Hz has no representable period",
            frequency_hz
        ))
    })
}

/// State moved onto the scheduling thread
struct Worker<C, S> {
    name: String,
    config: Arc<C>,
    state: Arc<Mutex<Option<S>>>,
    update: UpdateFn<C, S>,
    channels: ChannelSet,
    period: Duration,
    exit_requested: Arc<AtomicBool>,
    metrics: Arc<AtomicComponentMetrics>,
}

impl<C, S> Worker<C, S> {
    fn run(mut self) -> ChannelSet {
        let mut clock = Clock::new();
        while !self.exit_requested.load(Ordering::Acquire) {
            clock.reset();

            let Some(outputs) = self.update_once() else {
                log::error!("Component '{}' has no state, stopping", self.name);
                break;
            };
            self.metrics.ticks.fetch_add(1, Ordering::Relaxed);

            self.publish(outputs);
            self.spin_subscribers();

            if !clock.pace(self.period) {
                self.metrics.overruns.fetch_add(1, Ordering::Relaxed);
            }
        }

        log::info!(
            "Component '{}' stopped after {} ticks",
            self.name,
            self.metrics.ticks.load(Ordering::Relaxed)
        );
        self.channels
    }

    // The state lock is held only for the update call itself
    fn update_once(&mut self) -> Option<Outputs> {
        let mut guard = self.state.lock();
        let state = guard.as_mut()?;
        let tick = (self.update)(&*self.config, state);
        if !tick.keep_running {
            self.exit_requested.store(true, Ordering::Release);
            log::debug!("Component '{}': update requested exit", self.name);
        }
        Some(tick.outputs)
    }

    fn publish(&self, outputs: Outputs) {
        for (topic, payload) in outputs {
            match self.channels.publishers.get(&topic) {
                Some(publisher) => {
                    if let Err(e) = publisher.publish(&payload) {
                        self.metrics.publish_errors.fetch_add(1, Ordering::Relaxed);
                        log::warn!(
                            "Component '{}': publish to '{}' failed: {}",
                            self.name,
                            topic,
                            e
                        );
                    }
                }
                None => {
                    self.metrics
                        .unregistered_outputs
                        .fetch_add(1, Ordering::Relaxed);
                    log::warn!(
                        "Component '{}': no publisher registered for '{}', output dropped",
                        self.name,
                        topic
                    );
                }
            }
        }
    }

    fn spin_subscribers(&mut self) {
        for subscriber in self.channels.subscribers.iter_mut() {
            if let Err(e) = subscriber.spin_once() {
                self.metrics.spin_errors.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Component '{}': spin of '{}' failed: {}",
                    self.name,
                    subscriber.topic(),
                    e
                );
            }
        }
    }
}
