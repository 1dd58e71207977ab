use std::sync::Arc;

use actix_web::{dev::Payload, web::Data, FromRequest, HttpRequest};
use anyhow::anyhow;
use futures::future::LocalBoxFuture;
use type_map::concurrent::TypeMap;

use crate::{
    error::{self, AddCode, ServiceError},
    repository::RepositoryObject,
};

/// Process-wide dependencies, built once in `main` and shared by every worker.
pub struct ServiceState {
    pub repositories: TypeMap,
}

impl ServiceState {
    pub fn new() -> Self {
        Self {
            repositories: TypeMap::new(),
        }
    }

    pub fn insert<T: 'static>(&mut self, repository: RepositoryObject<T>) {
        self.repositories.insert(repository);
    }
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct Context(pub Arc<ServiceState>);

impl FromRequest for Context {
    type Error = ServiceError;

    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        fn from_request_inner(req: &HttpRequest, _payload: &mut Payload) -> error::Result<Context> {
            let Some(state) = req.app_data::<Data<Arc<ServiceState>>>() else {
                log::error!("No service state registered for {}", req.path());
                return Err(anyhow!("No state provided").code(500));
            };

            Ok(Context(Arc::clone(state.get_ref())))
        }
        let result = from_request_inner(req, payload);

        Box::pin(async move { result })
    }
}

impl Context {
    pub fn get_repository<T: 'static>(&self) -> Option<RepositoryObject<T>> {
        self.0.repositories.get::<RepositoryObject<T>>().cloned()
    }

    pub fn try_get_repository<T: 'static>(&self) -> error::Result<RepositoryObject<T>> {
        self.get_repository::<T>().ok_or(
            anyhow!(
                "Repository for type {} not found",
                std::any::type_name::<T>()
            )
            .code(500),
        )
    }
}
