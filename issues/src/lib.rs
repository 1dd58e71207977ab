pub mod api_doc;
pub mod config;
pub mod error;
pub mod handlers;
pub mod service;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::ServiceFactory;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::middleware;
use actix_web::web;
use actix_web::App;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::context::ServiceState;
use common::entities::issue::Issue;
use common::repository::test_repository::TestRepository;

use crate::api_doc::ApiDoc;
pub use crate::handlers::issue::*;

pub fn create_app(
    state: Arc<ServiceState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = actix_web::Error,
    >,
> {
    let cors = Cors::permissive();
    let app = App::new()
        .wrap(cors)
        .wrap(middleware::Logger::default())
        .app_data(web::Data::new(state))
        .service(get_issues)
        .service(post_issue)
        .service(put_issue)
        .service(delete_issue)
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
        );
    app
}

/// App backed by an empty in-memory issue repository.
pub fn create_test_app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = actix_web::Error,
    >,
> {
    let mut state = ServiceState::new();
    state.insert::<Issue>(Arc::new(TestRepository::<Issue>::new()));

    create_app(Arc::new(state))
}
