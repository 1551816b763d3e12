//! Registry behaviour: creation races, hierarchies, broadcast, dispatchers and shutdown.

mod common;

use actor_system::{
    Actor, ActorCreator, ActorError, ActorId, ActorSystem, ActorSystemError, ActorSystemSettings, Dispatcher,
    EntityId, EntityType, InitFailureStrategy, StopReason,
};
use common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_concurrent_creation_converges_on_one_mailbox() {
    let system = system();
    let id = ActorId::entity(EntityId::random(EntityType::Device));
    let created = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let system = system.clone();
            let id = id.clone();
            let created = created.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let (events_tx, _events) = probe_channel();
                let creator = ProbeCreator::new(id, Probe::new(events_tx)).counted(created);
                barrier.wait();
                system.create_root_actor(DISPATCHER, creator).unwrap()
            })
        })
        .collect();
    let refs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert!(refs.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(system.actor_count(), 1);
    system.shutdown();
}

#[test]
fn test_two_creators_for_the_same_id_get_the_same_mailbox() {
    let system = system();
    let id = ActorId::named("shared");
    let barrier = Arc::new(Barrier::new(2));
    let spawn = |system: Arc<ActorSystem<TestMsg>>, barrier: Arc<Barrier>, id: ActorId| {
        thread::spawn(move || {
            let (events_tx, _events) = probe_channel();
            barrier.wait();
            system
                .create_root_actor(DISPATCHER, ProbeCreator::new(id, Probe::new(events_tx)))
                .unwrap()
        })
    };
    let first = spawn(system.clone(), barrier.clone(), id.clone());
    let second = spawn(system.clone(), barrier, id.clone());
    let (first, second) = (first.join().unwrap(), second.join().unwrap());

    assert_eq!(first, second);
    assert_eq!(first, system.get_actor(&id).unwrap());
    system.shutdown();
}

/// Fails its first `create_actor` call after a pause, so other creators pile up behind it.
struct FlakyCreator {
    id: ActorId,
    attempts: Arc<AtomicUsize>,
    events: mpsc::Sender<Event>,
}

impl ActorCreator<TestMsg> for FlakyCreator {
    fn create_actor_id(&self) -> ActorId {
        self.id.clone()
    }

    fn create_actor(self) -> Result<Box<dyn Actor<TestMsg>>, ActorError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        if attempt == 0 {
            return Err(ActorError::failed("first creation fails"));
        }
        Ok(Box::new(Probe::new(self.events)))
    }
}

#[test]
fn test_failed_creation_does_not_let_a_second_mailbox_replace_the_first() {
    let system = system();
    let id = ActorId::named("flaky");
    let attempts = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let system = system.clone();
            let creator = FlakyCreator {
                id: id.clone(),
                attempts: attempts.clone(),
                events: probe_channel().0,
            };
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                // Late arrivals find the creation lock of the failed attempt already gone.
                thread::sleep(Duration::from_millis(5 * n));
                system.create_root_actor(DISPATCHER, creator)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let failures = results.iter().filter(|result| result.is_err()).count();
    assert_eq!(failures, 1);
    let registered = system.get_actor(&id).unwrap();
    for actor in results.into_iter().flatten() {
        assert_eq!(actor, registered);
    }
    assert_eq!(system.actor_count(), 1);
    system.shutdown();
}

#[test]
fn test_stopping_a_parent_stops_its_whole_subtree() {
    let system = system();
    let (events_tx, events) = probe_channel();
    let parent = ActorId::named("P");
    let c1 = ActorId::named("C1");
    let c2 = ActorId::named("C2");
    let grandchild = ActorId::named("G");
    system
        .create_root_actor(DISPATCHER, ProbeCreator::new(parent.clone(), Probe::new(events_tx.clone())))
        .unwrap();
    for child in [&c1, &c2] {
        system
            .create_child_actor(
                DISPATCHER,
                ProbeCreator::new(child.clone(), Probe::new(events_tx.clone())),
                &parent,
            )
            .unwrap();
    }
    system
        .create_child_actor(DISPATCHER, ProbeCreator::new(grandchild.clone(), Probe::new(events_tx)), &c1)
        .unwrap();

    let mut children = system.children(&parent);
    children.sort_by_key(|id| id.to_string());
    assert_eq!(children, vec![c1.clone(), c2.clone()]);

    system.stop(&parent);

    for id in [&parent, &c1, &c2, &grandchild] {
        assert!(system.get_actor(id).is_none(), "{id} still registered");
        let err = system.tell(id, TestMsg::Work { producer: 0, seq: 0 }).unwrap_err();
        assert!(err.is_actor_not_registered());
    }
    assert!(system.children(&parent).is_empty());
    assert_eq!(system.actor_count(), 0);

    let mut destroyed = 0;
    while destroyed < 4 {
        if let Event::Destroyed(reason) = next_event(&events) {
            assert_eq!(reason, StopReason::Stopped);
            destroyed += 1;
        }
    }
    system.shutdown();
}

#[test]
fn test_stopping_a_child_detaches_it_from_its_parent() {
    let system = system();
    let (events_tx, _events) = probe_channel();
    let parent = ActorId::named("parent");
    let child = ActorId::named("child");
    system
        .create_root_actor(DISPATCHER, ProbeCreator::new(parent.clone(), Probe::new(events_tx.clone())))
        .unwrap();
    system
        .create_child_actor(DISPATCHER, ProbeCreator::new(child.clone(), Probe::new(events_tx)), &parent)
        .unwrap();

    system.stop(&child);
    assert!(system.children(&parent).is_empty());
    assert!(system.get_actor(&parent).is_some());
    system.shutdown();
}

#[test]
fn test_broadcast_reaches_matching_children_only() {
    let system = system();
    let (tenant_tx, _tenant_events) = probe_channel();
    let tenant = ActorId::entity(EntityId::random(EntityType::Tenant));
    system
        .create_root_actor(DISPATCHER, ProbeCreator::new(tenant.clone(), Probe::new(tenant_tx)))
        .unwrap();

    let mut devices = Vec::new();
    for _ in 0..2 {
        let (tx, rx) = probe_channel();
        let id = ActorId::entity(EntityId::random(EntityType::Device));
        system
            .create_child_actor(DISPATCHER, ProbeCreator::new(id.clone(), Probe::new(tx)), &tenant)
            .unwrap();
        await_event(&rx, &Event::InitOk);
        devices.push((id, rx));
    }
    let (asset_tx, asset_events) = probe_channel();
    let asset = ActorId::entity(EntityId::random(EntityType::Asset));
    system
        .create_child_actor(DISPATCHER, ProbeCreator::new(asset.clone(), Probe::new(asset_tx)), &tenant)
        .unwrap();
    await_event(&asset_events, &Event::InitOk);

    let only_devices = |id: &ActorId| id.entity_type() == Some(EntityType::Device);
    assert_eq!(system.filter_children(&tenant, only_devices).len(), 2);

    system.broadcast_to_children_filtered(&tenant, only_devices, TestMsg::Urgent(1), true);
    for (_, rx) in &devices {
        assert_eq!(next_event(rx), Event::Urgent(1));
    }
    assert!(asset_events.recv_timeout(Duration::from_millis(200)).is_err());

    // A child that vanished is skipped without failing the broadcast.
    system.stop(&devices[0].0);
    system.broadcast_to_children(&tenant, TestMsg::Urgent(2));
    assert_eq!(next_event(&devices[1].1), Event::Urgent(2));
    assert_eq!(next_event(&asset_events), Event::Urgent(2));
    system.shutdown();
}

#[test]
fn test_actor_context_spawns_children_once() {
    let system = system();
    let (events_tx, events) = probe_channel();
    let parent = ActorId::named("spawner");
    system
        .create_root_actor(DISPATCHER, ProbeCreator::new(parent.clone(), Probe::new(events_tx)))
        .unwrap();
    await_event(&events, &Event::InitOk);

    system.tell(&parent, TestMsg::SpawnChild("spawned".into())).unwrap();
    await_event(&events, &Event::ChildSpawned);
    system.tell(&parent, TestMsg::SpawnChild("spawned".into())).unwrap();
    await_event(&events, &Event::ChildSpawned);

    assert_eq!(system.children(&parent), vec![ActorId::named("spawned")]);
    assert_eq!(system.actor_count(), 2);

    system.tell(&ActorId::named("spawned"), TestMsg::StopSelf).unwrap();
    await_event(&events, &Event::Destroyed(StopReason::Stopped));
    assert!(system.children(&parent).is_empty());
    system.shutdown();
}

#[test]
fn test_misconfiguration_is_reported() {
    let system = system();
    let (events_tx, _events) = probe_channel();

    let err = system
        .create_dispatcher(DISPATCHER, Dispatcher::fixed_thread_pool("dup", 1).unwrap())
        .unwrap_err();
    assert!(matches!(err, ActorSystemError::DispatcherAlreadyRegistered(_)));

    let err = system
        .create_root_actor("missing", ProbeCreator::new(ActorId::named("a"), Probe::new(events_tx.clone())))
        .unwrap_err();
    assert!(matches!(err, ActorSystemError::DispatcherNotRegistered(_)));

    let err = system
        .create_child_actor(
            DISPATCHER,
            ProbeCreator::new(ActorId::named("orphan"), Probe::new(events_tx)),
            &ActorId::named("nobody"),
        )
        .unwrap_err();
    assert!(err.is_actor_not_registered());
    assert!(system.get_actor(&ActorId::named("orphan")).is_none());

    let err = system.destroy_dispatcher("missing").unwrap_err();
    assert!(matches!(err, ActorSystemError::DispatcherNotRegistered(_)));
    system.shutdown();
}

#[test]
fn test_destroyed_dispatcher_can_no_longer_host_actors() {
    let system = system();
    system
        .create_dispatcher("extra", Dispatcher::fixed_thread_pool("extra", 1).unwrap())
        .unwrap();
    system.destroy_dispatcher("extra").unwrap();

    let (events_tx, _events) = probe_channel();
    let err = system
        .create_root_actor("extra", ProbeCreator::new(ActorId::named("late"), Probe::new(events_tx)))
        .unwrap_err();
    assert!(matches!(err, ActorSystemError::DispatcherNotRegistered(_)));
    system.shutdown();
}

#[test]
fn test_destroying_a_dispatcher_stops_its_actors() {
    let system = system();
    system
        .create_dispatcher("extra", Dispatcher::fixed_thread_pool("extra", 1).unwrap())
        .unwrap();
    let (events_tx, events) = probe_channel();
    let id = ActorId::named("bound");
    let probe = Probe::new(events_tx).failing_init(100, InitFailureStrategy::retry_with_delay(60_000));
    let actor = system
        .create_root_actor("extra", ProbeCreator::new(id.clone(), probe))
        .unwrap();
    assert_eq!(next_event(&events), Event::Init(1));

    let (stopped_tx, stopped) = mpsc::channel();
    actor.tell(TestMsg::Tracked { seq: 1, stopped: stopped_tx.clone() });
    assert_eq!(actor.pending_messages(), 1);

    system.destroy_dispatcher("extra").unwrap();
    assert_eq!(stopped.recv_timeout(TIMEOUT).unwrap(), (1, StopReason::Stopped));
    assert!(system.get_actor(&id).is_none());
    assert!(system
        .tell(&id, TestMsg::Tracked { seq: 2, stopped: stopped_tx.clone() })
        .unwrap_err()
        .is_actor_not_registered());

    actor.tell(TestMsg::Tracked { seq: 3, stopped: stopped_tx });
    assert_eq!(stopped.recv_timeout(TIMEOUT).unwrap(), (3, StopReason::Stopped));
    assert!(actor.is_stopped());
    system.shutdown();
}

#[test]
fn test_shutdown_notifies_messages_still_queued() {
    let system = system_with(ActorSystemSettings {
        dispatcher_shutdown_timeout_ms: 200,
        ..ActorSystemSettings::default()
    });
    let (events_tx, events) = probe_channel();
    let id = ActorId::named("never-ready");
    // Keeps failing init with a long delay, so messages stay queued.
    let probe = Probe::new(events_tx).failing_init(100, InitFailureStrategy::retry_with_delay(60_000));
    let actor = system
        .create_root_actor(DISPATCHER, ProbeCreator::new(id.clone(), probe))
        .unwrap();
    assert_eq!(next_event(&events), Event::Init(1));

    let (stopped_tx, stopped) = mpsc::channel();
    for seq in 1..=3 {
        actor.tell(TestMsg::Tracked { seq, stopped: stopped_tx.clone() });
    }
    assert_eq!(actor.pending_messages(), 3);

    system.shutdown();
    let mut notified: Vec<_> = (0..3).map(|_| stopped.recv_timeout(TIMEOUT).unwrap()).collect();
    notified.sort_by_key(|(seq, _)| *seq);
    assert_eq!(
        notified,
        vec![(1, StopReason::Stopped), (2, StopReason::Stopped), (3, StopReason::Stopped)]
    );
    assert!(system.get_actor(&id).is_none());

    actor.tell(TestMsg::Tracked { seq: 4, stopped: stopped_tx });
    assert_eq!(stopped.recv_timeout(TIMEOUT).unwrap(), (4, StopReason::Stopped));
}

#[test]
fn test_shutdown_is_final_for_actors_whose_init_failed() {
    let system = system();
    let (events_tx, events) = probe_channel();
    let probe = Probe::new(events_tx).failing_init(1, InitFailureStrategy::stop());
    let actor = system
        .create_root_actor(DISPATCHER, ProbeCreator::new(ActorId::named("gave-up"), probe))
        .unwrap();
    await_event(&events, &Event::Destroyed(StopReason::InitFailed));

    system.shutdown();
    // A re-init trigger no longer revives the mailbox once the system is stopped.
    actor.tell_with_high_priority(TestMsg::ComponentUpdated);
    let (stopped_tx, stopped) = mpsc::channel();
    actor.tell(TestMsg::Tracked { seq: 9, stopped: stopped_tx });

    assert_eq!(stopped.recv_timeout(TIMEOUT).unwrap(), (9, StopReason::Stopped));
    assert!(actor.is_stopped());
    assert_eq!(actor.pending_messages(), 0);
}

#[test]
fn test_shutdown_notifies_delayed_messages() {
    let system = system();
    let (events_tx, events) = probe_channel();
    let actor = system
        .create_root_actor(DISPATCHER, ProbeCreator::new(ActorId::named("delayed"), Probe::new(events_tx)))
        .unwrap();
    await_event(&events, &Event::InitOk);

    let (stopped_tx, stopped) = mpsc::channel();
    actor.tell_with_delay(TestMsg::Tracked { seq: 1, stopped: stopped_tx }, Duration::from_secs(60));
    system.shutdown();

    assert_eq!(stopped.recv_timeout(TIMEOUT).unwrap(), (1, StopReason::Stopped));
}

#[test]
fn test_invalid_settings_are_rejected() {
    let settings = ActorSystemSettings::new(0, 10, 1);
    let err = ActorSystem::<TestMsg>::new(settings).err().unwrap();
    assert!(matches!(err, ActorSystemError::InvalidSettings(_)));
}
