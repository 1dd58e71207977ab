use actix_web::{
    web::{Form, Json},
    Either,
};

pub mod issue;

/// Request body sent either as JSON or as an HTML form.
///
/// A body that is missing or is not an object is read as empty, so that the
/// handlers answer with their own validation messages.
pub type Body<T> = Option<Either<Json<T>, Form<T>>>;

pub fn into_body<T: Default>(body: Body<T>) -> T {
    match body {
        Some(Either::Left(Json(data))) | Some(Either::Right(Form(data))) => data,
        None => {
            log::debug!("Request body missing or malformed, treating it as empty");
            T::default()
        }
    }
}
