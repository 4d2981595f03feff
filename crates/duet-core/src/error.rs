use thiserror::Error;

use crate::document::DocumentError;
use crate::domain::{UserId, WorkspaceId};
use crate::ports::{AuthError, StoreError};

#[derive(Debug, Error)]
pub enum DuetError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("no workspace available for user_id={0}")]
    NoWorkspace(UserId),

    #[error("workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceId),
}
