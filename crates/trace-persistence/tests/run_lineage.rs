
use serde_json::json;
use trace_core::{trace, Component, ComponentRun, IOPointer, LineageStore, RunContext, RunStatus, StoreError};

#[test]
fn commit_requires_registered_component() {
    let Some(mut store) = test_support::store() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let mut run = ComponentRun::new(test_support::unique("ghost"));
    run.finish(RunStatus::Success);
    let err = store.commit_run(&mut run).unwrap_err();
    assert!(matches!(err, StoreError::UnknownComponent(_)), "{err:?}");
    assert!(run.id.is_none());
}

#[test]
fn traced_calls_persist_runs_with_dependencies() {
    let Some(mut store) = test_support::store() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let raw = test_support::unique("raw") + ".csv";
    let clean = test_support::unique("clean") + ".csv";
    let etl = Component::new("data-team", test_support::unique("etl"), "limpieza").with_tags(["etl"]);
    let train = Component::new("ml-team", test_support::unique("train"), "entrenamiento");

    let mut clean_fn = etl.run(etl.name(), &["src"], &["dst"], |(src, dst): (&str, &str), ctx: &mut RunContext| -> Result<(), String> {
                              ctx.set("src", json!(src));
                              ctx.set("dst", json!(dst));
                              ctx.note("dropped 3 rows");
                              Ok(())
                          });
    let first = clean_fn.call(&mut store, (raw.as_str(), clean.as_str())).expect("clean run");

    let mut train_fn = train.run(train.name(), &["data"], &["model"], |data: &str, ctx: &mut RunContext| -> Result<(), String> {
                                ctx.set("data", json!(data));
                                ctx.set("model", json!({"weights": [0.5, 0.25]}));
                                Ok(())
                            });
    let second = train_fn.call(&mut store, clean.as_str()).expect("train run");

    let first_id = first.run.id.expect("id");
    let second_id = second.run.id.expect("id");
    assert!(second_id > first_id);
    assert_eq!(second.run.dependencies, vec![first_id]);

    let loaded = store.get_run(second_id).expect("get").expect("present");
    assert_eq!(loaded.component_name, train.name());
    assert_eq!(loaded.status, RunStatus::Success);
    assert_eq!(loaded.inputs, second.run.inputs);
    assert_eq!(loaded.outputs, second.run.outputs);
    assert_eq!(loaded.dependencies, vec![first_id]);

    let loaded_first = store.get_run(first_id).expect("get").expect("present");
    assert_eq!(loaded_first.notes, "dropped 3 rows");

    let comp = store.get_component(etl.name()).expect("get").expect("present");
    assert_eq!(comp.owner, "data-team");
    assert_eq!(comp.tags, vec!["etl".to_string()]);

    let clean_ptr = IOPointer::inferred(clean.clone());
    assert_eq!(store.producer_of(&clean_ptr).expect("producer"), Some(first_id));

    let model_ptr = second.run.outputs.iter().next().cloned().expect("model pointer");
    let entries = trace(&store, &model_ptr, None).expect("trace");
    let ids: Vec<_> = entries.iter().map(|e| (e.depth, e.run.id)).collect();
    assert_eq!(ids, vec![(0, Some(second_id)), (1, Some(first_id))]);

    let recent = store.runs_for_component(train.name(), 10).expect("runs");
    assert_eq!(recent.len(), 1);
}

#[test]
fn recommit_is_rejected() {
    let Some(mut store) = test_support::store() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let c = Component::new("o", test_support::unique("noop"), "d");
    store.upsert_component(&c.record()).expect("component");
    let mut run = ComponentRun::new(c.name());
    run.finish(RunStatus::Success);
    store.commit_run(&mut run).expect("first commit");
    assert!(matches!(store.commit_run(&mut run), Err(StoreError::Conflict(_))));
}

#[test]
fn unbounded_limit_returns_every_run() {
    let Some(mut store) = test_support::store() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let c = Component::new("o", test_support::unique("unbounded"), "d");
    store.upsert_component(&c.record()).expect("component");
    for _ in 0..2 {
        let mut run = ComponentRun::new(c.name());
        run.finish(RunStatus::Success);
        store.commit_run(&mut run).expect("commit");
    }
    let runs = store.runs_for_component(c.name(), usize::MAX).expect("runs");
    assert_eq!(runs.len(), 2);
    assert!(runs[0].id > runs[1].id, "más reciente primero");
}
