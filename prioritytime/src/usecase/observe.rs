use crate::db::{LeisureSubscription, Snapshot};
use crate::error::Result;
use crate::model::Leisure;
use crate::repository::LeisureRepository;
use std::sync::Arc;

/// Read side: the ordered listing, once or live.
pub struct GetLeisuresUseCase<R> {
    repo: Arc<R>,
}

impl<R: LeisureRepository> GetLeisuresUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        GetLeisuresUseCase { repo }
    }

    pub fn execute(&self) -> Result<Vec<Leisure>> {
        let entities = self.repo.get_leisures()?;
        Ok(entities.into_iter().map(Leisure::from).collect())
    }

    pub fn get(&self, id: i64) -> Result<Leisure> {
        Ok(self.repo.get_leisure(id)?.into())
    }

    /// Live listing of every leisure.
    pub fn observe(&self) -> LeisureObserver {
        LeisureObserver {
            subscription: self.repo.observe_leisures(),
            only: None,
        }
    }

    /// Live view of a single leisure. Its snapshots are empty once the
    /// leisure is gone.
    pub fn observe_leisure(&self, id: i64) -> LeisureObserver {
        LeisureObserver {
            subscription: self.repo.observe_leisures(),
            only: Some(id),
        }
    }
}

/// Maps raw listing snapshots to display models, optionally narrowed to one
/// leisure.
pub struct LeisureObserver {
    subscription: LeisureSubscription,
    only: Option<i64>,
}

impl LeisureObserver {
    pub fn current(&mut self) -> Vec<Leisure> {
        let snapshot = self.subscription.current();
        self.map(&snapshot)
    }

    pub fn has_changed(&self) -> bool {
        self.subscription.has_changed()
    }

    /// Wait for the next committed change. `None` once storage is gone.
    pub async fn changed(&mut self) -> Option<Vec<Leisure>> {
        let snapshot = self.subscription.changed().await?;
        Some(self.map(&snapshot))
    }

    fn map(&self, snapshot: &Snapshot) -> Vec<Leisure> {
        snapshot
            .iter()
            .filter(|e| self.only.map_or(true, |id| e.id == id))
            .map(Leisure::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PriorityError;
    use crate::usecase::fake::FakeRepository;
    use crate::usecase::{AddLeisureUseCase, IncrementLeisureUseCase, RemoveLeisureUseCase};

    #[test]
    fn test_execute_maps_depth() {
        let repo = Arc::new(
            FakeRepository::new()
                .with_row(1, "a", 0, "/")
                .with_row(2, "b", 0, "/1/"),
        );
        let use_case = GetLeisuresUseCase::new(repo);

        let leisures = use_case.execute().unwrap();
        let shape: Vec<(i64, usize)> = leisures.iter().map(|l| (l.id, l.depth)).collect();
        assert_eq!(shape, vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let use_case = GetLeisuresUseCase::new(Arc::new(FakeRepository::new()));
        assert!(matches!(
            use_case.get(8),
            Err(PriorityError::NotFound { id: 8 })
        ));
    }

    #[test]
    fn test_observe_sees_added_leisure() {
        let repo = Arc::new(FakeRepository::new());
        let get = GetLeisuresUseCase::new(Arc::clone(&repo));
        let add = AddLeisureUseCase::new(Arc::clone(&repo));
        let mut observer = get.observe();
        assert!(observer.current().is_empty());

        add.execute("fake", None).unwrap();

        assert!(observer.has_changed());
        let current = observer.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "fake");
    }

    #[test]
    fn test_observe_single_leisure() {
        let repo = Arc::new(
            FakeRepository::new()
                .with_row(1, "a", 0, "/")
                .with_row(2, "b", 0, "/1/"),
        );
        let get = GetLeisuresUseCase::new(Arc::clone(&repo));
        let increment = IncrementLeisureUseCase::new(Arc::clone(&repo));
        let remove = RemoveLeisureUseCase::new(Arc::clone(&repo));
        let mut observer = get.observe_leisure(2);

        increment.execute(2).unwrap();
        let current = observer.current();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].counter, 1);

        remove.execute(1).unwrap();
        assert!(observer.current().is_empty());
    }

    #[tokio::test]
    async fn test_changed_resolves_after_write() {
        let repo = Arc::new(FakeRepository::new());
        let get = GetLeisuresUseCase::new(Arc::clone(&repo));
        let add = AddLeisureUseCase::new(Arc::clone(&repo));
        let mut observer = get.observe();

        add.execute("later", None).unwrap();

        let next = observer.changed().await.unwrap();
        assert_eq!(next[0].name, "later");
    }
}
