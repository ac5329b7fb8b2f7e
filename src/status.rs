//! HTTP status codes the service emits, as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use partsbin::{Response, Status};
//!
//! Response::status(Status::NotFound);
//!
//! Response::builder()
//!     .status(Status::TooManyRequests)
//!     .json(br#"{"error":"Too many requests"}"#.to_vec());
//! ```

use http::StatusCode;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,                  // 200
    NotFound,            // 404
    MethodNotAllowed,    // 405
    TooManyRequests,     // 429
    InternalServerError, // 500
}

impl From<Status> for StatusCode {
    fn from(s: Status) -> StatusCode {
        match s {
            Status::Ok                  => StatusCode::OK,
            Status::NotFound            => StatusCode::NOT_FOUND,
            Status::MethodNotAllowed    => StatusCode::METHOD_NOT_ALLOWED,
            Status::TooManyRequests     => StatusCode::TOO_MANY_REQUESTS,
            Status::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        StatusCode::from(s).as_u16()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_wire_codes() {
        assert_eq!(u16::from(Status::Ok), 200);
        assert_eq!(u16::from(Status::NotFound), 404);
        assert_eq!(u16::from(Status::MethodNotAllowed), 405);
        assert_eq!(u16::from(Status::TooManyRequests), 429);
        assert_eq!(StatusCode::from(Status::InternalServerError), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
