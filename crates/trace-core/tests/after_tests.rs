//! Escenarios de referencia de los tests posteriores a la ejecución.

use serde_json::json;
use trace_core::{component_test, Component, InMemoryLineageStore, LineageStore, RunContext, RunStatus};

component_test! {
    AccumulatingTest("Dummy") {
        fn testCorrect(vars) {
            let n = vars.get_mut("n").ok_or("n not captured")?;
            let bumped = n[0].as_i64().ok_or("n[0] is not an int")? + 10;
            n[0] = json!(bumped);
            println!("testCorrect called");
            Ok(())
        }
        fn testAlsoCorrect(vars) {
            let n = vars.get_mut("n").ok_or("n not captured")?;
            let bumped = n[0].as_i64().ok_or("n[0] is not an int")? + 10;
            n[0] = json!(bumped);
            println!("testAlsoCorrect called");
            Ok(())
        }
        fn TestNotCorrect(_vars) {
            Err("TestNotCorrect called!".into())
        }
    }
}

component_test! {
    DecoyTest("Dummy") {
        fn testCorrect(_vars) {
            println!("DEBUG: testCorrect called");
            Ok(())
        }
        fn TestNotCorrect(_vars) { Err("TestNotCorrect called!".into()) }
        fn notCorrect(_vars) { Err("notCorrect called!".into()) }
        fn Test(_vars) { Err("Test called!".into()) }
    }
}

#[test]
fn runs_all_test_methods() {
    let c = Component::new("aditi", "test", "test_description").after_test::<AccumulatingTest>();
    let mut store = InMemoryLineageStore::new();
    let val = json!([100]);

    let mut function = c.run("test_component", &[], &["n"], |_: (), ctx: &mut RunContext| -> Result<(), String> {
                           ctx.set("n", val.clone());
                           Ok(())
                       });

    let call = function.call(&mut store, ()).expect("traced call");
    assert_eq!(call.outputs.get("n"), Some(&json!([120])));
    assert_eq!(call.tests_invoked, 2);
}

#[test]
fn runs_only_test_prefixed_methods() {
    let c = Component::new("aditi", "test", "test_description").after_test::<DecoyTest>();
    let mut store = InMemoryLineageStore::new();

    let mut function = c.run("test_component", &[], &["n"], |_: (), ctx: &mut RunContext| -> Result<(), String> {
                           ctx.set("n", 100);
                           Ok(())
                       });

    let call = function.call(&mut store, ()).expect("decoys must not be invoked");
    assert_eq!(call.tests_invoked, 1);
    assert_eq!(call.outputs.get("n"), Some(&json!(100)));
}

#[test]
fn empty_after_tests_still_records_run() {
    let c = Component::new("aditi", "test", "test_description");
    let mut store = InMemoryLineageStore::new();

    let mut function = c.run("test_component", &["src"], &["dst"], |_: (), ctx: &mut RunContext| -> Result<(), String> {
                           ctx.set("src", "raw.csv");
                           ctx.set("dst", "clean.csv");
                           Ok(())
                       });

    let call = function.call(&mut store, ()).expect("traced call");
    assert_eq!(call.tests_invoked, 0);
    assert_eq!(call.run.status, RunStatus::Success);
    let stored = store.get_run(call.run.id.expect("id")).unwrap().expect("stored run");
    assert_eq!(stored.component_name, "test_component");
    assert_eq!(store.get_component("test_component").unwrap().unwrap().owner, "aditi");
}

#[test]
fn repeated_calls_create_fresh_runs_and_link_lineage() {
    let producer = Component::new("aditi", "ingest", "loads raw data");
    let consumer = Component::new("aditi", "clean", "cleans raw data");
    let mut store = InMemoryLineageStore::new();

    let mut ingest = producer.run("ingest", &[], &["raw"], |day: u32, ctx: &mut RunContext| -> Result<(), String> {
                         ctx.set("raw", format!("raw/{day}.csv"));
                         Ok(())
                     });
    let mut clean = consumer.run("clean", &["raw"], &["out"], |day: u32, ctx: &mut RunContext| -> Result<(), String> {
                        ctx.set("raw", format!("raw/{day}.csv"));
                        ctx.set("out", format!("clean/{day}.csv"));
                        Ok(())
                    });

    let first = ingest.call(&mut store, 1).unwrap().run;
    let second = ingest.call(&mut store, 1).unwrap().run;
    assert_ne!(first.id, second.id);

    let cleaned = clean.call(&mut store, 1).unwrap().run;
    assert_eq!(cleaned.dependencies, vec![second.id.unwrap()]);

    let lineage = trace_core::trace(&store, &trace_core::IOPointer::inferred("clean/1.csv"), None).unwrap();
    assert_eq!(lineage.len(), 2);
    assert_eq!(lineage[1].run.component_name, "ingest");
}
