use actix_web::{web, HttpResponse};
use std::collections::HashMap;
use url::form_urlencoded;

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors gracefully.
/// Repeated keys keep the last value.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<HashMap<String, String>, HttpResponse> {
    let body = match std::str::from_utf8(form_bytes) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn decodes_url_encoded_fields() {
        let body = web::Bytes::from_static(b"email=a%40example.com&username=Test+User1&password=");
        let parsed = parse_form(&body).unwrap();
        assert_eq!(parsed["email"], "a@example.com");
        assert_eq!(parsed["username"], "Test User1");
        assert_eq!(parsed["password"], "");
    }

    #[test]
    fn rejects_invalid_utf8() {
        let body = web::Bytes::from_static(&[0xff, 0xfe, b'=', b'x']);
        let response = parse_form(&body).unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
