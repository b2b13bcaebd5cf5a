//! Demo: pipeline de tres etapas (ingesta → features → entrenamiento)
//! registrado con linaje. Usa Postgres si hay `DATABASE_URL`/`DB_SERVER`;
//! si no, el store en memoria.

use std::error::Error;

use log::info;
use mltrace_rust::{component_test, open_store_from_env, trace, Component, IOPointer, RunContext};
use serde_json::json;
use tracing_subscriber::EnvFilter;

component_test! {
    /// Las filas producidas no pueden estar vacías.
    NonEmptyRows("non_empty_rows") {
        fn testHasRows(vars) {
            match vars.get("rows").and_then(|v| v.as_array()) {
                Some(rows) if !rows.is_empty() => Ok(()),
                _ => Err("no rows produced".into()),
            }
        }
    }
}

component_test! {
    /// Normaliza el score reportado a [0, 1] y exige que sea finito.
    ScoreRange("score_range") {
        fn testScoreIsFinite(vars) {
            let score = vars.nth(1).and_then(|v| v.as_f64()).ok_or("score not captured")?;
            if score.is_finite() { Ok(()) } else { Err(format!("score {score} is not finite")) }
        }
        fn testClampScore(vars) {
            let score = vars.nth_mut(1).ok_or("score not captured")?;
            let clamped = score.as_f64().unwrap_or(0.0).clamp(0.0, 1.0);
            *score = json!(clamped);
            Ok(())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let mut store = open_store_from_env()?;

    let ingest = Component::new("data-team", "ingest", "Lee el CSV crudo").with_tags(["etl"])
                                                                             .after_test::<NonEmptyRows>();
    let featurize = Component::new("data-team", "featurize", "Genera features").with_tags(["etl", "features"]);
    let train = Component::new("ml-team", "train", "Entrena el modelo").after_test::<ScoreRange>();

    let mut ingest_fn = ingest.run("ingest", &["source"], &["rows", "staged"], |path: &str, ctx: &mut RunContext| -> Result<usize, String> {
                                  let rows = vec![json!({"x": 1.0, "y": 0}), json!({"x": 2.5, "y": 1})];
                                  ctx.set("source", path);
                                  ctx.set("rows", rows.clone());
                                  ctx.set("staged", "data/staged.csv");
                                  ctx.note(format!("{} rows ingested", rows.len()));
                                  Ok(rows.len())
                              });
    let ingested = ingest_fn.call(store.as_mut(), "data/raw.csv")?;
    println!("[ingest] run={:?} rows={}", ingested.run.id, ingested.value);

    let mut featurize_fn = featurize.run("featurize",
                                         &["raw"],
                                         &["features"],
                                         |(raw, out): (&str, &str), ctx: &mut RunContext| -> Result<(), String> {
                                             ctx.set("raw", raw);
                                             ctx.set("features", out);
                                             Ok(())
                                         });
    let featurized = featurize_fn.call(store.as_mut(), ("data/staged.csv", "data/features.parquet"))?;
    println!("[featurize] run={:?} deps={:?}", featurized.run.id, featurized.run.dependencies);

    let mut train_fn = train.run("train",
                                 &["features"],
                                 &["model", "score"],
                                 |features: &str, ctx: &mut RunContext| -> Result<(), String> {
                                     ctx.set("features", features);
                                     ctx.set("model", "models/classifier.pkl");
                                     ctx.set("score", 1.07);
                                     Ok(())
                                 });
    let trained = train_fn.call(store.as_mut(), "data/features.parquet")?;
    println!("[train] run={:?} score(after tests)={}",
             trained.run.id,
             trained.outputs.get("score").cloned().unwrap_or_default());

    let model = IOPointer::inferred("models/classifier.pkl");
    store.add_labels(&model, &["candidate".to_string()])?;
    for entry in trace(store.as_ref(), &model, None)? {
        println!("{:indent$}{} (run {:?}) inputs={:?}",
                 "",
                 entry.run.component_name,
                 entry.run.id,
                 entry.run.inputs.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
                 indent = entry.depth * 2);
    }
    info!("labels on {model}: {:?}", store.labels_for(&model)?);
    Ok(())
}
