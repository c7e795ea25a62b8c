//! OAuth 1.0a request signing (HMAC-SHA1)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;

use crate::credentials::Credentials;

/// RFC 3986 unreserved characters stay as-is, everything else is encoded
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE).to_string()
}

/// Per-request values that vary between calls
#[derive(Debug, Clone)]
pub struct RequestNonce {
    pub nonce: String,
    pub timestamp: u64,
}

impl RequestNonce {
    pub fn fresh() -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp,
        }
    }
}

/// Compute the `oauth_signature` for a request.
///
/// `params` are the query and form parameters that take part in the
/// signature; multipart and JSON bodies do not.
pub fn signature(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &RequestNonce,
) -> String {
    let timestamp = nonce.timestamp.to_string();
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    pairs.extend(
        oauth_params(credentials, nonce, &timestamp)
            .into_iter()
            .map(|(k, v)| (encode(k), encode(v))),
    );
    pairs.sort();

    let param_string = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.access_token_secret)
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC takes keys of any size"));
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Build the `Authorization` header value for a request
pub fn authorization_header(
    credentials: &Credentials,
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    nonce: &RequestNonce,
) -> String {
    let sig = signature(credentials, method, url, params, nonce);
    let timestamp = nonce.timestamp.to_string();
    let mut fields = oauth_params(credentials, nonce, &timestamp);
    fields.push(("oauth_signature", sig.as_str()));
    fields.sort();

    let rendered = fields
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", rendered)
}

fn oauth_params<'a>(
    credentials: &'a Credentials,
    nonce: &'a RequestNonce,
    timestamp: &'a str,
) -> Vec<(&'static str, &'a str)> {
    vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ]
}
