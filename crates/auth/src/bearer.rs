/// Extract the credential from an `Authorization` header value.
///
/// Accepts `Bearer <token>` with a case-insensitive scheme. Returns `None`
/// for any other scheme or an empty credential.
pub fn extract_bearer(header: &str) -> Option<&str> {
    let header = header.trim();
    let (scheme, rest) = header.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = rest.trim();
    if token.is_empty() { None } else { Some(token) }
}
