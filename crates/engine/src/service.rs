use std::future::Future;

use api_types::entity::{Entity, Payload};
use uuid::Uuid;

use crate::ServiceError;

/// Backend collaborator used by [`FormController`](crate::FormController) to
/// load and save one kind of entity.
pub trait EntityService {
    fn get_entity(&self, id: &str) -> impl Future<Output = Result<Entity, ServiceError>> + Send;

    /// `idempotency_key` stays the same when an unchanged payload is submitted
    /// again after a failure, so a retry after a lost response cannot create
    /// the entity twice.
    fn create_entity(
        &self,
        payload: &Payload,
        idempotency_key: Uuid,
    ) -> impl Future<Output = Result<Entity, ServiceError>> + Send;

    fn update_entity(
        &self,
        id: &str,
        payload: &Payload,
    ) -> impl Future<Output = Result<Entity, ServiceError>> + Send;
}
