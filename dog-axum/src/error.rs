use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dog_core::errors::DogError;

#[derive(Debug)]
pub struct DogAxumError(pub anyhow::Error);

impl From<anyhow::Error> for DogAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<DogError> for DogAxumError {
    fn from(e: DogError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for DogAxumError {
    fn into_response(self) -> Response {
        // A DogError anywhere in the chain keeps its status and shape
        if let Some(dog) = self.0.chain().find_map(|e| e.downcast_ref::<DogError>()) {
            return dog_response(dog);
        }

        // Anything else is a GeneralError
        dog_response(&DogError::general_error(self.0.to_string()))
    }
}

fn dog_response(dog: &DogError) -> Response {
    let safe = dog.sanitize_for_client();
    let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(safe.to_json())).into_response()
}
