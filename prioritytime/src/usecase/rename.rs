use super::validate_name;
use crate::error::Result;
use crate::repository::LeisureRepository;
use std::sync::Arc;

pub struct RenameLeisureUseCase<R> {
    repo: Arc<R>,
}

impl<R: LeisureRepository> RenameLeisureUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        RenameLeisureUseCase { repo }
    }

    pub fn execute(&self, id: i64, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.repo.rename_leisure(id, name)
    }
}
