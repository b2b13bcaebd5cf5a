//! Mismo pipeline contra Postgres (se omite sin `DATABASE_URL`).

use mltrace_rust::persistence::{DbConfig, PgLineageStore};
use mltrace_rust::{Component, IOPointer, LineageStore, RunContext};

#[test]
fn pipeline_roundtrip_on_postgres() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    let cfg = DbConfig::from_env().expect("config");
    let mut store = PgLineageStore::connect(&cfg).expect("store");
    let suffix = uuid::Uuid::new_v4();
    let input = format!("raw-{suffix}.csv");
    let output = format!("clean-{suffix}.csv");

    let c = Component::new("data-team", format!("clean-{suffix}"), "Limpieza").with_tags(["etl"]);
    let mut f = c.run(c.name(), &["src"], &["dst"], |(src, dst): (&str, &str), ctx: &mut RunContext| -> Result<(), String> {
                     ctx.set("src", src);
                     ctx.set("dst", dst);
                     Ok(())
                 });
    let first = f.call(&mut store, (input.as_str(), output.as_str())).expect("first");
    let second = f.call(&mut store, (output.as_str(), input.as_str())).expect("second");
    let first_id = first.run.id.expect("id");
    assert_eq!(second.run.dependencies, vec![first_id]);

    let runs = store.runs_for_component(c.name(), 5).expect("runs");
    let ids: Vec<_> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.run.id, first.run.id]);
    assert_eq!(store.producer_of(&IOPointer::inferred(output)).expect("producer"), Some(first_id));
}
