//! Use cases hold every policy decision: where a new leisure goes, what
//! counter it starts with, and which rows an increment or removal touches.
//! They talk to storage only through [`LeisureRepository`].
//!
//! [`LeisureRepository`]: crate::repository::LeisureRepository

pub mod add;
pub mod increment;
pub mod observe;
pub mod remove;
pub mod rename;

#[cfg(test)]
pub(crate) mod fake;

pub use add::AddLeisureUseCase;
pub use increment::IncrementLeisureUseCase;
pub use observe::{GetLeisuresUseCase, LeisureObserver};
pub use remove::RemoveLeisureUseCase;
pub use rename::RenameLeisureUseCase;

use crate::error::{PriorityError, Result};

/// Names set by a use case must carry something besides whitespace.
fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PriorityError::Validation(
            "leisure name must not be empty".into(),
        ));
    }
    Ok(trimmed)
}
