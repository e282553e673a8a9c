pub mod v1;

use actix_web::error::ErrorBadRequest;
use actix_web::{dev::Payload, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Caller identity forwarded by the auth gateway.
#[derive(Debug)]
pub struct AdminHeaders {
    user_id: String,
}

impl AdminHeaders {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl FromRequest for AdminHeaders {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let headers = req.headers();

        let user_id = match headers.get("X-User-Id") {
            Some(value) => match value.to_str() {
                Ok(str_val) if !str_val.trim().is_empty() => str_val.trim().to_string(),
                Ok(_) => {
                    return ready(Err(ErrorBadRequest("Invalid x-user-id: must not be empty")));
                }
                Err(_) => {
                    return ready(Err(ErrorBadRequest(
                        "Invalid x-user-id: must be a valid string",
                    )));
                }
            },
            None => {
                return ready(Err(ErrorBadRequest("Missing X-User-Id header")));
            }
        };

        ready(Ok(AdminHeaders { user_id }))
    }
}
