pub mod invoices;
pub mod payments;
pub mod references;

use actix_web::HttpRequest;
use uuid::Uuid;

use crate::adapters::http::errors::ApiError;

/// Set by the upstream auth layer to the id of the acting user.
pub const ACTOR_HEADER: &str = "X-User-Id";

/// Actor of the request, `None` when the header is absent.
pub fn optional_actor_id(req: &HttpRequest) -> Result<Option<Uuid>, ApiError> {
  let Some(value) = req.headers().get(ACTOR_HEADER) else {
    return Ok(None);
  };

  value
    .to_str()
    .ok()
    .and_then(|v| Uuid::parse_str(v.trim()).ok())
    .map(Some)
    .ok_or_else(|| {
      tracing::warn!("Malformed {} header on {}", ACTOR_HEADER, req.path());
      ApiError::Unauthorized(format!("{} header is not a valid UUID", ACTOR_HEADER))
    })
}

pub fn actor_id(req: &HttpRequest) -> Result<Uuid, ApiError> {
  optional_actor_id(req)?
    .ok_or_else(|| ApiError::Unauthorized(format!("{} header is required", ACTOR_HEADER)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[test]
  fn test_actor_header_parsing() {
    let id = Uuid::new_v4();
    let req = TestRequest::default()
      .insert_header((ACTOR_HEADER, id.to_string()))
      .to_http_request();
    assert_eq!(actor_id(&req).unwrap(), id);

    let req = TestRequest::default().to_http_request();
    assert!(optional_actor_id(&req).unwrap().is_none());
    assert!(actor_id(&req).is_err());

    let req = TestRequest::default()
      .insert_header((ACTOR_HEADER, "not-a-uuid"))
      .to_http_request();
    assert!(optional_actor_id(&req).is_err());
  }
}
