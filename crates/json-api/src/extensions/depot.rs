//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use trellis_app::domain::users::records::UserUuid;

use crate::identity::Caller;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_caller(&mut self, caller: Caller);

    fn caller(&self) -> Option<&Caller>;

    /// The authenticated user, or 401 when the identity middleware did not run.
    fn user_uuid_or_401(&self) -> Result<UserUuid, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_caller(&mut self, caller: Caller) {
        self.inject(caller);
    }

    fn caller(&self) -> Option<&Caller> {
        self.obtain::<Caller>().ok()
    }

    fn user_uuid_or_401(&self) -> Result<UserUuid, StatusError> {
        self.caller()
            .map(|caller| caller.user_uuid)
            .ok_or_else(StatusError::unauthorized)
    }
}
