use crate::schemas::UserNick;
use actix_web::{
    dev::Payload, error::ErrorUnauthorized, http::header::HeaderValue, FromRequest, HttpRequest,
};
use futures::future::{ready, Ready};

/// Header carrying the nick of the already-authenticated caller, set by the
/// proxy in front of this service.
pub const USER_HEADER: &str = "X-User";

/// The user on whose behalf a request acts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub UserNick);

impl Actor {
    pub fn nick(&self) -> &str {
        &self.0
    }
}

pub fn actor_from_request(request: &HttpRequest) -> Option<Actor> {
    let nick = request
        .headers()
        .get(USER_HEADER)
        .map(HeaderValue::to_str)?
        .ok()?
        .trim();
    if nick.is_empty() {
        return None;
    }
    Some(Actor(nick.to_string()))
}

impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(request: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(actor_from_request(request).ok_or_else(|| {
            ErrorUnauthorized(format!("missing or empty {} header", USER_HEADER))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_the_user_header() {
        let request = TestRequest::default()
            .insert_header((USER_HEADER, " alice "))
            .to_http_request();
        assert_eq!(actor_from_request(&request), Some(Actor("alice".to_string())));
    }

    #[test]
    fn missing_or_blank_header_is_anonymous() {
        let request = TestRequest::default().to_http_request();
        assert_eq!(actor_from_request(&request), None);

        let request = TestRequest::default()
            .insert_header((USER_HEADER, "  "))
            .to_http_request();
        assert_eq!(actor_from_request(&request), None);
    }
}
