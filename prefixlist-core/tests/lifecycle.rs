//! End-to-end lifecycles against the simulated control plane.

use std::future::Future;
use std::sync::Arc;

use prefixlist_core::{
    AddressFamily, Entry, HandlerError, InMemoryRemoteStore, InvocationContext, PrefixList,
    PrefixListHandlers, ProgressSignal, ReconcilerConfig, RemoteCall, SimulationSettings, Tag,
};

const MAX_INVOCATIONS: usize = 20;

/// Re-invoke `step` with the saved context until it stops continuing.
async fn drive<T, F, Fut>(mut step: F) -> (ProgressSignal<T>, usize)
where
    F: FnMut(Option<InvocationContext>) -> Fut,
    Fut: Future<Output = Result<ProgressSignal<T>, HandlerError>>,
{
    let mut saved = None;
    for invocation in 1..=MAX_INVOCATIONS {
        let signal = step(saved.take()).await.expect("handler error");
        match signal {
            ProgressSignal::Continue { context, .. } => saved = Some(context),
            terminal => return (terminal, invocation),
        }
    }
    panic!("operation did not finish within {} invocations", MAX_INVOCATIONS);
}

fn setup(settings: SimulationSettings) -> (PrefixListHandlers, InMemoryRemoteStore) {
    let store = InMemoryRemoteStore::with_settings(settings);
    let handlers = PrefixListHandlers::new(Arc::new(store.clone()), ReconcilerConfig::default());
    (handlers, store)
}

fn office() -> PrefixList {
    PrefixList::new("office", 5, AddressFamily::Ipv4)
        .with_entries(vec![
            Entry::new("1.1.1.1/32", "A"),
            Entry::new("1.1.1.3/32", "A"),
        ])
        .with_tags(vec![Tag::new("Purpose", "Testing")])
}

fn done<T: std::fmt::Debug>(signal: ProgressSignal<T>) -> T {
    match signal {
        ProgressSignal::Done(value) => value,
        other => panic!("expected done, got {:?}", other),
    }
}

#[tokio::test]
async fn full_lifecycle() {
    let (handlers, store) = setup(SimulationSettings {
        settle_after_polls: 2,
        page_size: 1,
        ..SimulationSettings::default()
    });

    // Create: one issuing call, two pending polls, one settled poll.
    let desired = office();
    let (signal, invocations) = drive(|ctx| handlers.create(&desired, ctx)).await;
    let created = done(signal);
    assert_eq!(invocations, 4);
    let id = created.id.clone().expect("id assigned");

    // Update entries, tags and name together.
    let mut desired = created.clone();
    desired.name = "office-v2".into();
    desired.entries = vec![Entry::new("1.1.1.1/32", "B"), Entry::new("1.1.1.2/32", "A")];
    desired.tags = vec![Tag::new("Purpose", "Prod")];
    let (signal, _) = drive(|ctx| handlers.update(&desired, ctx)).await;
    let updated = done(signal);
    assert_eq!(updated.version, Some(2));

    // Read back: entries come through one page at a time.
    let read = done(handlers.read(&id).await.unwrap());
    assert_eq!(read.name, "office-v2");
    assert_eq!(read.entries, desired.entries);
    assert_eq!(read.tags, desired.tags);
    assert_eq!(read.version, Some(2));

    // A second update with the same model does nothing.
    store.clear_calls().await;
    let (signal, invocations) = drive(|ctx| handlers.update(&read, ctx)).await;
    done(signal);
    assert_eq!(invocations, 1);
    assert!(store.mutating_calls().await.is_empty());

    let listed = done(handlers.list().await.unwrap());
    assert_eq!(listed, vec![read.clone()]);

    let (signal, _) = drive(|ctx| handlers.delete(&read, ctx)).await;
    assert_eq!(signal, ProgressSignal::Done(()));
    assert!(!store.contains(&id).await);
    assert!(handlers.read(&id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn update_issues_exactly_one_entry_modification() {
    let (handlers, store) = setup(SimulationSettings {
        settle_after_polls: 3,
        ..SimulationSettings::default()
    });
    let model = office();
    let (signal, _) = drive(|ctx| handlers.create(&model, ctx)).await;
    let mut desired = done(signal);
    desired.entries.push(Entry::bare("2.2.2.2/32"));

    store.clear_calls().await;
    let (signal, invocations) = drive(|ctx| handlers.update(&desired, ctx)).await;
    done(signal);
    assert_eq!(invocations, 5);

    let modifies: Vec<_> = store
        .mutating_calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, RemoteCall::Modify(_)))
        .collect();
    assert_eq!(modifies.len(), 1);
}

#[tokio::test]
async fn immediate_settlement_finishes_on_second_invocation() {
    let (handlers, _store) = setup(SimulationSettings {
        settle_after_polls: 0,
        ..SimulationSettings::default()
    });
    let model = office();
    let (signal, invocations) = drive(|ctx| handlers.create(&model, ctx)).await;
    done(signal);
    assert_eq!(invocations, 2);
}
