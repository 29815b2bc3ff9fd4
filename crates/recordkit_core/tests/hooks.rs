//! Hook ordering and failure paths, including adapter faults.

use futures::FutureExt;
use parking_lot::Mutex;
use recordkit_adapter::MemoryAdapter;
use recordkit_core::{
    CoreError, Filter, Hook, HookSlot, InstanceState, IterateOptions, Model, Schema,
    ValidityCheck, Value,
};
use recordkit_testkit::prelude::*;
use std::sync::Arc;

fn faulty_person() -> (Arc<FaultyAdapter>, Model) {
    let adapter = Arc::new(FaultyAdapter::new(Arc::new(MemoryAdapter::new())));
    let schema = Schema::new(adapter.clone());
    let person = person_model(&schema, Arc::new(FixedClock::new(PersonFixture::EPOCH)));
    (adapter, person)
}

/// Installs a recording hook on every slot.
fn record_slots(model: &Model) -> Arc<Mutex<Vec<HookSlot>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for slot in HookSlot::ALL {
        let log = Arc::clone(&log);
        model.set_hook(
            slot,
            Some(Hook::sync(move |_| {
                log.lock().push(slot);
                Ok(())
            })),
        );
    }
    log
}

#[tokio::test]
async fn hooks_run_in_lifecycle_order() {
    let fixture = PersonFixture::new();
    let log = record_slots(&fixture.person);

    let mut person = fixture
        .person
        .create(record! { "name" => "Ann" })
        .await
        .unwrap();
    person.set("age", 3).unwrap();
    person.save().await.unwrap();
    person.destroy().await.unwrap();

    assert_eq!(
        *log.lock(),
        [
            HookSlot::BeforeCreate,
            HookSlot::AfterCreate,
            HookSlot::BeforeSave,
            HookSlot::AfterSave,
            HookSlot::BeforeDestroy,
            HookSlot::AfterDestroy,
        ]
    );
}

#[tokio::test]
async fn saving_new_instance_runs_save_hooks_only() {
    let fixture = PersonFixture::new();
    let log = record_slots(&fixture.person);

    let mut person = fixture.person.new_instance(record! {});
    person.save().await.unwrap();
    assert_eq!(*log.lock(), [HookSlot::BeforeSave, HookSlot::AfterSave]);
}

#[tokio::test]
async fn before_create_may_modify_instance() {
    let fixture = PersonFixture::new();
    fixture.person.before_create(Hook::new(|instance| {
        async move {
            if instance.get("name").is_null() {
                instance.set("name", "Anonymous")
            } else {
                Ok(())
            }
        }
        .boxed()
    }));
    fixture.person.validates_presence_of("name");

    let person = fixture.person.create(record! {}).await.unwrap();
    let stored = fixture.person.find(person.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.get("name"), Value::from("Anonymous"));
}

#[tokio::test]
async fn failing_before_save_aborts_without_writing() {
    let fixture = PersonFixture::new();
    let mut person = fixture
        .person
        .create(record! { "name" => "Ann" })
        .await
        .unwrap();
    fixture
        .person
        .before_save(Hook::with_next(|_, next| next.fail("frozen")));

    person.set("name", "Bea").unwrap();
    let err = person.save().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::HookFailed {
            slot: HookSlot::BeforeSave,
            ..
        }
    ));
    assert!(person.property_changed("name"));
    let stored = fixture.person.find(person.id().unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.get("name"), Value::from("Ann"));
}

#[tokio::test]
async fn dropped_continuation_fails_the_operation() {
    let fixture = PersonFixture::new();
    fixture
        .person
        .before_destroy(Hook::with_next(|_, next| drop(next)));
    let mut person = fixture.person.create(record! {}).await.unwrap();

    let err = person.destroy().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::HookFailed {
            slot: HookSlot::BeforeDestroy,
            ..
        }
    ));
    assert_eq!(person.state(), InstanceState::Persisted);
    assert_eq!(fixture.stored(), 1);
}

#[tokio::test]
async fn hook_errors_pass_through_unchanged() {
    let fixture = PersonFixture::new();
    fixture
        .person
        .after_create(Hook::sync(|instance| instance.set("nickname", "x")));

    let rejected = fixture.person.create(record! {}).await.unwrap_err();
    assert!(matches!(rejected.error, CoreError::UnknownAttribute { .. }));
    // The record was written before afterCreate ran.
    assert!(!rejected.instance.is_new_record());
    assert_eq!(fixture.stored(), 1);
}

#[tokio::test]
async fn replacing_a_hook_keeps_only_the_latest() {
    let fixture = PersonFixture::new();
    fixture
        .person
        .before_create(Hook::sync(|instance| instance.set("age", 1)));
    fixture
        .person
        .before_create(Hook::sync(|instance| instance.set("age", 2)));

    let person = fixture.person.create(record! {}).await.unwrap();
    assert_eq!(person.get("age"), Value::from(2));

    fixture.person.set_hook(HookSlot::BeforeCreate, None);
    let person = fixture.person.create(record! {}).await.unwrap();
    assert!(person.get("age").is_null());
}

#[tokio::test]
async fn destroyed_instances_reject_mutation() {
    let fixture = PersonFixture::new();
    let mut person = fixture
        .person
        .create(record! { "name" => "Ann" })
        .await
        .unwrap();
    person.set("name", "Bob").unwrap();
    person.destroy().await.unwrap();

    assert!(person.reset().unwrap_err().is_state());
    assert_eq!(person.get("name"), Value::from("Bob"));
    assert!(person
        .override_validity(Some(ValidityCheck::fixed(true)))
        .unwrap_err()
        .is_state());
    assert_eq!(person.state(), InstanceState::Destroyed);

    assert!(person.set("name", "Ann").unwrap_err().is_state());
    assert!(person.save().await.unwrap_err().is_state());
    assert!(person.destroy().await.unwrap_err().is_state());
    assert!(person
        .update_attributes(record! { "age" => 1 })
        .await
        .unwrap_err()
        .is_state());
}

#[tokio::test]
async fn destroying_new_instance_is_rejected() {
    let fixture = PersonFixture::new();
    let mut person = fixture.person.new_instance(record! {});
    let err = person.destroy().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidState {
            state: InstanceState::Transient,
            ..
        }
    ));
}

mod faults {
    use super::*;

    #[tokio::test]
    async fn create_failure_leaves_instance_new() {
        let (adapter, person) = faulty_person();
        let log = record_slots(&person);
        adapter.fail_on(Operation::Create);

        let rejected = person.create(record! { "name" => "Ann" }).await.unwrap_err();
        assert!(rejected.error.is_adapter());
        assert!(rejected.instance.is_new_record());
        assert_eq!(*log.lock(), [HookSlot::BeforeCreate]);
    }

    #[tokio::test]
    async fn save_failure_keeps_pending_changes() {
        let (adapter, model) = faulty_person();
        let mut person = model.create(record! {}).await.unwrap();
        adapter.fail_on(Operation::Save);

        person.set("name", "Ann").unwrap();
        assert!(person.save().await.unwrap_err().is_adapter());
        assert!(person.property_changed("name"));

        adapter.heal();
        person.save().await.unwrap();
        assert!(!person.property_changed("name"));
    }

    #[tokio::test]
    async fn update_attributes_sends_partial_update() {
        let (adapter, model) = faulty_person();
        let mut person = model.create(record! {}).await.unwrap();
        person
            .update_attributes(record! { "name" => "Ann", "age" => 3 })
            .await
            .unwrap();
        assert_eq!(adapter.call_count(Operation::UpdateAttributes), 1);
        assert_eq!(adapter.call_count(Operation::Save), 0);
        assert!(person.changed().is_empty());
    }

    #[tokio::test]
    async fn destroy_failure_keeps_instance_persisted() {
        let (adapter, model) = faulty_person();
        let mut person = model.create(record! {}).await.unwrap();
        adapter.fail_on(Operation::Destroy);

        assert!(person.destroy().await.unwrap_err().is_adapter());
        assert_eq!(person.state(), InstanceState::Persisted);
    }

    #[tokio::test]
    async fn batch_failures_are_isolated() {
        let (adapter, model) = faulty_person();
        adapter.fail_after(2);

        let outcome = model.create_many(named_people(4)).await;
        assert_eq!(outcome.len(), 4);
        assert_eq!(outcome.failures(), 2);
        assert_eq!(
            outcome.instances.iter().filter(|p| !p.is_new_record()).count(),
            2
        );
    }

    #[tokio::test]
    async fn page_fetch_failure_stops_iteration() {
        let (adapter, model) = faulty_person();
        seed_people(&model, 10).await;
        adapter.fail_after(1);

        let mut seen = 0;
        let err = model
            .iterate(IterateOptions::new(4), |_, _| {
                seen += 1;
                async { Ok(()) }
            })
            .await
            .unwrap_err();
        assert!(err.is_adapter());
        assert_eq!(seen, 4);
        assert_eq!(adapter.call_count(Operation::All), 2);
    }

    #[tokio::test]
    async fn uniqueness_propagates_adapter_errors() {
        let (adapter, model) = faulty_person();
        model.validates_uniqueness_of("name");
        adapter.fail_on(Operation::All);

        let mut person = model.new_instance(record! { "name" => "Ann" });
        assert!(person.is_valid().await.unwrap_err().is_adapter());
        assert_eq!(model.count(&Filter::new()).await.unwrap(), 0);
    }
}
