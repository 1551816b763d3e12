//! Shared probe actor for the integration tests.
//!
//! A [`Probe`] reports everything that happens to it as [`Event`]s on a channel, so tests
//! can assert on ordering without sleeping.

#![allow(dead_code)]

use actor_system::{
    Actor, ActorCreator, ActorCtx, ActorError, ActorId, ActorMsg, ActorSystem, ActorSystemSettings,
    Dispatcher, InitFailureStrategy, MsgType, ProcessFailureStrategy, StopReason,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

pub const DISPATCHER: &str = "test-dispatcher";
pub const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum TestMsg {
    Work { producer: u32, seq: u32 },
    Urgent(u32),
    Fail,
    Panic,
    Reinit,
    ComponentUpdated,
    Tracked { seq: u32, stopped: Sender<(u32, StopReason)> },
    ScheduleTimeout(u64),
    Timeout,
    SpawnChild(String),
    StopSelf,
}

impl ActorMsg for TestMsg {
    fn msg_type(&self) -> MsgType {
        match self {
            TestMsg::ComponentUpdated => MsgType::ComponentUpdated,
            TestMsg::Timeout => MsgType::Timeout,
            _ => MsgType::Other,
        }
    }

    fn on_actor_stopped(self, reason: StopReason) {
        if let TestMsg::Tracked { seq, stopped } = self {
            let _ = stopped.send((seq, reason));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Init(u32),
    InitOk,
    Work { producer: u32, seq: u32 },
    Urgent(u32),
    ComponentUpdated,
    Tracked(u32),
    Timeout,
    ChildSpawned,
    ProcessFailed,
    Destroyed(StopReason),
}

pub struct Probe {
    events: Sender<Event>,
    init_gate: Option<Receiver<()>>,
    fail_init_until: u32,
    init_strategy: InitFailureStrategy,
    stop_on_failure: bool,
    attempts: u32,
    ctx: Option<ActorCtx<TestMsg>>,
}

impl Probe {
    pub fn new(events: Sender<Event>) -> Self {
        Self {
            events,
            init_gate: None,
            fail_init_until: 0,
            init_strategy: InitFailureStrategy::retry_immediately(),
            stop_on_failure: false,
            attempts: 0,
            ctx: None,
        }
    }

    /// The first `init` blocks until the gate is signalled (or dropped).
    pub fn gated(mut self, gate: Receiver<()>) -> Self {
        self.init_gate = Some(gate);
        self
    }

    /// `init` fails for attempts `1..=attempts`.
    pub fn failing_init(mut self, attempts: u32, strategy: InitFailureStrategy) -> Self {
        self.fail_init_until = attempts;
        self.init_strategy = strategy;
        self
    }

    pub fn stop_on_failure(mut self) -> Self {
        self.stop_on_failure = true;
        self
    }

    fn emit(&self, event: Event) {
        let _ = self.events.send(event);
    }
}

impl Actor<TestMsg> for Probe {
    fn init(&mut self, ctx: ActorCtx<TestMsg>) -> Result<(), ActorError> {
        self.attempts += 1;
        self.emit(Event::Init(self.attempts));
        if let Some(gate) = self.init_gate.take() {
            let _ = gate.recv_timeout(Duration::from_secs(10));
        }
        if self.attempts <= self.fail_init_until {
            return Err(ActorError::failed(format!("init attempt {} failed", self.attempts)));
        }
        self.ctx = Some(ctx);
        self.emit(Event::InitOk);
        Ok(())
    }

    fn process(&mut self, msg: TestMsg) -> Result<(), ActorError> {
        match msg {
            TestMsg::Work { producer, seq } => self.emit(Event::Work { producer, seq }),
            TestMsg::Urgent(seq) => self.emit(Event::Urgent(seq)),
            TestMsg::Fail => return Err("boom".into()),
            TestMsg::Panic => panic!("probe panicked"),
            TestMsg::Reinit => return Err(ActorError::reinit_required("configuration changed")),
            TestMsg::ComponentUpdated => self.emit(Event::ComponentUpdated),
            TestMsg::Tracked { seq, .. } => self.emit(Event::Tracked(seq)),
            TestMsg::Timeout => self.emit(Event::Timeout),
            TestMsg::ScheduleTimeout(delay_ms) => {
                let ctx = self.ctx.as_ref().ok_or("actor has no context")?;
                ctx.schedule_to_self(TestMsg::Timeout, Duration::from_millis(delay_ms));
            }
            TestMsg::SpawnChild(name) => {
                let ctx = self.ctx.as_ref().ok_or("actor has no context")?;
                let events = self.events.clone();
                let child_id = ActorId::named(name);
                let creator_id = child_id.clone();
                ctx.get_or_create_child_actor(
                    &child_id,
                    || DISPATCHER.to_string(),
                    move || ProbeCreator::new(creator_id, Probe::new(events)),
                    || true,
                )
                .map_err(ActorError::failed)?;
                self.emit(Event::ChildSpawned);
            }
            TestMsg::StopSelf => {
                let ctx = self.ctx.as_ref().ok_or("actor has no context")?;
                ctx.stop(ctx.self_id());
            }
        }
        Ok(())
    }

    fn destroy(&mut self, reason: StopReason) {
        self.emit(Event::Destroyed(reason));
    }

    fn on_init_failure(&mut self, _attempt: u32, _error: &ActorError) -> InitFailureStrategy {
        self.init_strategy
    }

    fn on_process_failure(&mut self, error: &ActorError) -> ProcessFailureStrategy {
        self.emit(Event::ProcessFailed);
        if self.stop_on_failure || error.is_panic() {
            ProcessFailureStrategy::stop()
        } else {
            ProcessFailureStrategy::resume()
        }
    }
}

pub struct ProbeCreator {
    id: ActorId,
    probe: Probe,
    created: Option<Arc<AtomicUsize>>,
}

impl ProbeCreator {
    pub fn new(id: ActorId, probe: Probe) -> Self {
        Self {
            id,
            probe,
            created: None,
        }
    }

    /// Counts `create_actor` invocations in `counter`.
    pub fn counted(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.created = Some(counter);
        self
    }
}

impl ActorCreator<TestMsg> for ProbeCreator {
    fn create_actor_id(&self) -> ActorId {
        self.id.clone()
    }

    fn create_actor(self) -> Result<Box<dyn Actor<TestMsg>>, ActorError> {
        if let Some(counter) = &self.created {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(Box::new(self.probe))
    }
}

pub fn system_with(settings: ActorSystemSettings) -> Arc<ActorSystem<TestMsg>> {
    let system = ActorSystem::new(settings).expect("actor system");
    system
        .create_dispatcher(
            DISPATCHER,
            Dispatcher::fixed_thread_pool(DISPATCHER, 2).expect("executor"),
        )
        .expect("dispatcher");
    system
}

pub fn system() -> Arc<ActorSystem<TestMsg>> {
    system_with(ActorSystemSettings::default())
}

pub fn next_event(events: &Receiver<Event>) -> Event {
    events
        .recv_timeout(TIMEOUT)
        .expect("timed out waiting for actor event")
}

/// Skips events until one matches `wanted`.
pub fn await_event(events: &Receiver<Event>, wanted: &Event) {
    loop {
        if &next_event(events) == wanted {
            return;
        }
    }
}

pub fn probe_channel() -> (Sender<Event>, Receiver<Event>) {
    mpsc::channel()
}
