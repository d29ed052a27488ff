// CSRF token mirroring: cookie -> request headers

use std::borrow::Cow;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use percent_encoding::percent_decode_str;

/// Iterate `name=value` pairs across every `Cookie` header
pub fn parse_cookies(headers: &HeaderMap) -> impl Iterator<Item = (&str, &str)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim(), value.trim()))
        })
}

/// First non-empty token found among `cookie_names`, in configuration order
///
/// Values are percent-decoded the way browsers' cookie helpers write them;
/// a value that does not decode to UTF-8 is returned raw.
pub fn find_csrf_token<'a>(
    headers: &'a HeaderMap,
    cookie_names: &[String],
) -> Option<Cow<'a, str>> {
    cookie_names.iter().find_map(|wanted| {
        parse_cookies(headers)
            .find(|(name, value)| name == wanted && !value.is_empty())
            .map(|(_, value)| {
                percent_decode_str(value)
                    .decode_utf8()
                    .unwrap_or(Cow::Borrowed(value))
            })
    })
}

/// Copy the CSRF cookie value into every configured header, overwriting client values
pub fn inject_csrf_headers(
    inbound: &HeaderMap,
    outbound: &mut HeaderMap,
    cookie_names: &[String],
    header_names: &[String],
) -> bool {
    let Some(token) = find_csrf_token(inbound, cookie_names) else {
        return false;
    };
    let Ok(value) = HeaderValue::from_str(&token) else {
        tracing::warn!("CSRF cookie holds a value that is not a valid header, skipped");
        return false;
    };

    for name in header_names {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            outbound.insert(name, value.clone());
        }
    }
    true
}
