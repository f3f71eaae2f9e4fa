use crate::error::Result;
use crate::repository::LeisureRepository;
use std::sync::Arc;

/// Deletes a leisure together with everything beneath it.
pub struct RemoveLeisureUseCase<R> {
    repo: Arc<R>,
}

impl<R: LeisureRepository> RemoveLeisureUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        RemoveLeisureUseCase { repo }
    }

    /// Returns how many leisures were removed.
    pub fn execute(&self, id: i64) -> Result<usize> {
        let scope = self.repo.get_ancestry(id)?.child(id);
        self.repo.remove_leisures(&scope)
    }
}
