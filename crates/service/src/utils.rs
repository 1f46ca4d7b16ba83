use sea_orm::DbErr;
use tracing::{error, warn};

use crate::errors::ServiceError;
use crate::session::Session;

/// Commits the session, making sure it is rolled back if the commit fails.
///
/// # Errors
/// `CommitFailed` carrying `message` and the driver error.
pub async fn safe_commit(session: &mut Session, message: &str) -> Result<(), ServiceError> {
    match session.commit().await {
        Ok(()) => Ok(()),
        Err(err) => Err(rollback_after(session, message, err).await),
    }
}

/// Rolls back pending work after a failed write and builds the `CommitFailed`
/// error to report.
///
/// When the commit itself failed, [`Session::commit`] has already dropped the
/// transaction, and dropping it rolls it back; only a failed staging write
/// leaves a transaction open for the explicit rollback here.
pub(crate) async fn rollback_after(session: &mut Session, message: &str, cause: DbErr) -> ServiceError {
    if session.in_transaction() {
        warn!(error = %cause, "{message} Rolling back.");
        if let Err(rollback_err) = session.rollback().await {
            error!(error = %rollback_err, "rollback after failed write also failed");
        }
    } else {
        warn!(error = %cause, "{message} Transaction rolled back on drop.");
    }
    ServiceError::commit_failed(message, cause)
}
