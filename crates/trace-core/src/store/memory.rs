use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;

use super::LineageStore;
use crate::errors::StoreError;
use crate::model::{ComponentRecord, ComponentRun, DeletedLabel, IOPointer, PointerType};

/// Store en memoria. Los ids de run son 1-based y monotónicos.
#[derive(Debug, Default)]
pub struct InMemoryLineageStore {
    components: BTreeMap<String, ComponentRecord>,
    pointers: BTreeSet<IOPointer>,
    runs: Vec<ComponentRun>,
    labels: BTreeMap<IOPointer, BTreeSet<String>>,
    deleted_labels: Vec<DeletedLabel>,
}

impl InMemoryLineageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    fn merge_tags(record: &mut ComponentRecord, tags: &[String]) {
        for t in tags {
            if !record.tags.contains(t) {
                record.tags.push(t.clone());
            }
        }
        record.tags.sort();
    }
}

impl LineageStore for InMemoryLineageStore {
    fn upsert_component(&mut self, component: &ComponentRecord) -> Result<(), StoreError> {
        let entry = self.components
                        .entry(component.name.clone())
                        .or_insert_with(|| ComponentRecord { tags: Vec::new(),
                                                             ..component.clone() });
        entry.description = component.description.clone();
        entry.owner = component.owner.clone();
        Self::merge_tags(entry, &component.tags);
        Ok(())
    }

    fn get_component(&self, name: &str) -> Result<Option<ComponentRecord>, StoreError> {
        Ok(self.components.get(name).cloned())
    }

    fn upsert_io_pointer(&mut self, name: &str, pointer_type: PointerType) -> Result<IOPointer, StoreError> {
        let p = IOPointer::new(name, pointer_type);
        self.pointers.insert(p.clone());
        Ok(p)
    }

    fn get_io_pointer(&self, name: &str, pointer_type: PointerType) -> Result<Option<IOPointer>, StoreError> {
        let p = IOPointer::new(name, pointer_type);
        Ok(self.pointers.get(&p).cloned())
    }

    fn commit_run(&mut self, run: &mut ComponentRun) -> Result<i64, StoreError> {
        if let Some(id) = run.id {
            return Err(StoreError::Conflict(format!("component run {id} already committed")));
        }
        if !self.components.contains_key(&run.component_name) {
            return Err(StoreError::UnknownComponent(run.component_name.clone()));
        }
        let referenced: Vec<IOPointer> = run.pointers().cloned().collect();
        self.pointers.extend(referenced);

        let mut deps = BTreeSet::new();
        for input in &run.inputs {
            if let Some(id) = self.producer_of(input)? {
                deps.insert(id);
            }
        }
        let id = self.runs.len() as i64 + 1;
        run.id = Some(id);
        run.dependencies = deps.into_iter().collect();
        self.runs.push(run.clone());
        Ok(id)
    }

    fn get_run(&self, id: i64) -> Result<Option<ComponentRun>, StoreError> {
        if id < 1 {
            return Ok(None);
        }
        Ok(self.runs.get((id - 1) as usize).cloned())
    }

    fn runs_for_component(&self, component_name: &str, limit: usize) -> Result<Vec<ComponentRun>, StoreError> {
        Ok(self.runs
               .iter()
               .rev()
               .filter(|r| r.component_name == component_name)
               .take(limit)
               .cloned()
               .collect())
    }

    fn producer_of(&self, pointer: &IOPointer) -> Result<Option<i64>, StoreError> {
        Ok(self.runs.iter().rev().find(|r| r.outputs.contains(pointer)).and_then(|r| r.id))
    }

    fn add_tags(&mut self, component_name: &str, tags: &[String]) -> Result<(), StoreError> {
        let record = self.components
                         .get_mut(component_name)
                         .ok_or_else(|| StoreError::UnknownComponent(component_name.to_string()))?;
        Self::merge_tags(record, tags);
        Ok(())
    }

    fn add_labels(&mut self, pointer: &IOPointer, labels: &[String]) -> Result<(), StoreError> {
        self.pointers.insert(pointer.clone());
        self.labels.entry(pointer.clone()).or_default().extend(labels.iter().cloned());
        Ok(())
    }

    fn remove_labels(&mut self, pointer: &IOPointer, labels: &[String]) -> Result<usize, StoreError> {
        let Some(current) = self.labels.get_mut(pointer) else {
            return Ok(0);
        };
        let now = Utc::now();
        let mut removed = 0;
        for label in labels {
            if current.remove(label) {
                removed += 1;
                self.deleted_labels.push(DeletedLabel { label: label.clone(),
                                                        pointer: pointer.clone(),
                                                        deleted_at: now });
            }
        }
        Ok(removed)
    }

    fn labels_for(&self, pointer: &IOPointer) -> Result<Vec<String>, StoreError> {
        Ok(self.labels.get(pointer).map(|s| s.iter().cloned().collect()).unwrap_or_default())
    }

    fn deleted_labels_for(&self, pointer: &IOPointer) -> Result<Vec<DeletedLabel>, StoreError> {
        Ok(self.deleted_labels.iter().filter(|d| &d.pointer == pointer).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, tags: &[&str]) -> ComponentRecord {
        ComponentRecord { name: name.into(),
                          description: format!("{name} step"),
                          owner: "team".into(),
                          tags: tags.iter().map(|t| t.to_string()).collect() }
    }

    fn run_with(component: &str, inputs: &[&str], outputs: &[&str]) -> ComponentRun {
        let mut run = ComponentRun::new(component);
        run.add_inputs(inputs.iter().map(|n| IOPointer::inferred(*n)));
        run.add_outputs(outputs.iter().map(|n| IOPointer::inferred(*n)));
        run
    }

    #[test]
    fn io_pointer_upsert_is_idempotent_and_roundtrips() {
        let mut store = InMemoryLineageStore::new();
        let a = store.upsert_io_pointer("train.csv", PointerType::Data).unwrap();
        let b = store.upsert_io_pointer("train.csv", PointerType::Data).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.pointer_count(), 1);
        // mismo nombre, otro tipo: otra identidad
        store.upsert_io_pointer("train.csv", PointerType::Unknown).unwrap();
        assert_eq!(store.pointer_count(), 2);
        let fetched = store.get_io_pointer("train.csv", PointerType::Data).unwrap().unwrap();
        assert_eq!(fetched.name, "train.csv");
        assert_eq!(fetched.pointer_type, PointerType::Data);
        assert!(store.get_io_pointer("missing", PointerType::Data).unwrap().is_none());
    }

    #[test]
    fn upsert_component_accumulates_tags() {
        let mut store = InMemoryLineageStore::new();
        store.upsert_component(&record("clean", &["etl"])).unwrap();
        store.upsert_component(&record("clean", &["daily"])).unwrap();
        store.add_tags("clean", &["etl".into(), "prod".into()]).unwrap();
        let c = store.get_component("clean").unwrap().unwrap();
        assert_eq!(c.tags, vec!["daily".to_string(), "etl".to_string(), "prod".to_string()]);
        assert!(matches!(store.add_tags("nope", &[]), Err(StoreError::UnknownComponent(_))));
    }

    #[test]
    fn commit_requires_component_and_rejects_recommit() {
        let mut store = InMemoryLineageStore::new();
        let mut run = run_with("clean", &["raw.csv"], &["clean.csv"]);
        assert_eq!(store.commit_run(&mut run), Err(StoreError::UnknownComponent("clean".into())));
        store.upsert_component(&record("clean", &[])).unwrap();
        assert_eq!(store.commit_run(&mut run).unwrap(), 1);
        assert!(matches!(store.commit_run(&mut run), Err(StoreError::Conflict(_))));
        // pointers creados de forma perezosa
        assert!(store.get_io_pointer("raw.csv", PointerType::Data).unwrap().is_some());
        assert!(store.get_io_pointer("clean.csv", PointerType::Data).unwrap().is_some());
    }

    #[test]
    fn dependencies_point_to_latest_producer() {
        let mut store = InMemoryLineageStore::new();
        for c in ["ingest", "clean", "train"] {
            store.upsert_component(&record(c, &[])).unwrap();
        }
        let first = store.commit_run(&mut run_with("ingest", &[], &["raw.csv"])).unwrap();
        let second = store.commit_run(&mut run_with("ingest", &[], &["raw.csv"])).unwrap();
        let mut clean = run_with("clean", &["raw.csv"], &["clean.csv"]);
        store.commit_run(&mut clean).unwrap();
        assert_eq!(clean.dependencies, vec![second]);
        assert_ne!(first, second);

        let mut train = run_with("train", &["clean.csv", "raw.csv"], &["model.pkl"]);
        store.commit_run(&mut train).unwrap();
        assert_eq!(train.dependencies, vec![second, clean.id.unwrap()]);

        let recent = store.runs_for_component("ingest", 10).unwrap();
        assert_eq!(recent.iter().map(|r| r.id.unwrap()).collect::<Vec<_>>(), vec![second, first]);
        assert_eq!(store.runs_for_component("ingest", 1).unwrap().len(), 1);
    }

    #[test]
    fn labels_soft_delete() {
        let mut store = InMemoryLineageStore::new();
        let p = IOPointer::inferred("preds.csv");
        store.add_labels(&p, &["pii".into(), "v1".into()]).unwrap();
        store.add_labels(&p, &["v1".into()]).unwrap();
        assert_eq!(store.labels_for(&p).unwrap(), vec!["pii".to_string(), "v1".to_string()]);
        assert_eq!(store.remove_labels(&p, &["pii".into(), "absent".into()]).unwrap(), 1);
        assert_eq!(store.labels_for(&p).unwrap(), vec!["v1".to_string()]);
        let deleted = store.deleted_labels_for(&p).unwrap();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].label, "pii");
        assert_eq!(store.remove_labels(&IOPointer::inferred("other"), &["v1".into()]).unwrap(), 0);
    }
}
