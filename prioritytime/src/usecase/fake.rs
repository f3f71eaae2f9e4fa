//! In-memory repository that records what the use cases asked for.

use crate::ancestry::AncestryPath;
use crate::db::{LeisureSubscription, Snapshot};
use crate::error::{PriorityError, Result};
use crate::model::{LeisureEntity, NewLeisure};
use crate::repository::LeisureRepository;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetAncestry(i64),
    GetLeisureCounter(i64),
    GetLowestCounter(String),
    CountAt(String),
    AddLeisure(NewLeisure),
    Increment(Vec<i64>),
    Remove(String),
    Rename(i64, String),
}

pub struct FakeRepository {
    rows: Mutex<Vec<LeisureEntity>>,
    calls: Mutex<Vec<Call>>,
    snapshots: watch::Sender<Snapshot>,
}

impl FakeRepository {
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        FakeRepository {
            rows: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            snapshots,
        }
    }

    /// Seed a row with a fixed id, bypassing the recorded calls.
    pub fn with_row(self, id: i64, name: &str, counter: i64, ancestry: &str) -> Self {
        self.rows.lock().unwrap().push(LeisureEntity {
            id,
            name: name.to_string(),
            counter,
            ancestry: AncestryPath::from_existing(ancestry).unwrap(),
            updated: Utc::now(),
        });
        self.publish();
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn added(&self) -> Vec<NewLeisure> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AddLeisure(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn find(&self, id: i64) -> Result<LeisureEntity> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(PriorityError::NotFound { id })
    }

    fn publish(&self) {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| {
            (a.ancestry.to_string(), a.id).cmp(&(b.ancestry.to_string(), b.id))
        });
        self.snapshots.send_replace(Arc::new(rows));
    }
}

impl LeisureRepository for FakeRepository {
    fn get_ancestry(&self, id: i64) -> Result<AncestryPath> {
        self.record(Call::GetAncestry(id));
        Ok(self.find(id)?.ancestry)
    }

    fn get_leisure_counter(&self, id: i64) -> Result<i64> {
        self.record(Call::GetLeisureCounter(id));
        Ok(self.find(id)?.counter)
    }

    fn get_lowest_counter(&self, ancestry: &AncestryPath) -> Result<i64> {
        self.record(Call::GetLowestCounter(ancestry.to_string()));
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.ancestry == ancestry)
            .map(|r| r.counter)
            .min()
            .unwrap_or(0))
    }

    fn count_at(&self, ancestry: &AncestryPath) -> Result<i64> {
        self.record(Call::CountAt(ancestry.to_string()));
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.ancestry == ancestry)
            .count() as i64)
    }

    fn add_leisure(&self, leisure: NewLeisure) -> Result<i64> {
        self.record(Call::AddLeisure(leisure.clone()));
        let id = {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            rows.push(LeisureEntity {
                id,
                name: leisure.name,
                counter: leisure.counter,
                ancestry: leisure.ancestry,
                updated: leisure.updated,
            });
            id
        };
        self.publish();
        Ok(id)
    }

    fn get_leisure(&self, id: i64) -> Result<LeisureEntity> {
        self.find(id)
    }

    fn get_leisures(&self) -> Result<Vec<LeisureEntity>> {
        Ok(self.snapshots.borrow().as_ref().clone())
    }

    fn observe_leisures(&self) -> LeisureSubscription {
        LeisureSubscription::new(self.snapshots.subscribe())
    }

    fn increment_leisures(&self, ids: &[i64]) -> Result<()> {
        self.record(Call::Increment(ids.to_vec()));
        {
            let mut rows = self.rows.lock().unwrap();
            for row in rows.iter_mut().filter(|r| ids.contains(&r.id)) {
                row.counter += 1;
                row.updated = Utc::now();
            }
        }
        self.publish();
        Ok(())
    }

    fn remove_leisures(&self, scope: &AncestryPath) -> Result<usize> {
        self.record(Call::Remove(scope.to_string()));
        let prefix = scope.to_string();
        let target = scope.parent_id();
        let removed = {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| {
                Some(r.id) != target && !r.ancestry.to_string().starts_with(&prefix)
            });
            before - rows.len()
        };
        self.publish();
        Ok(removed)
    }

    fn rename_leisure(&self, id: i64, name: &str) -> Result<()> {
        self.record(Call::Rename(id, name.to_string()));
        {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(PriorityError::NotFound { id })?;
            row.name = name.to_string();
        }
        self.publish();
        Ok(())
    }
}
