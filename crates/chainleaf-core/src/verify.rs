//! Verification URLs: the payload encoded into a batch QR code.
//!
//! The convention is `<origin>/verify/<batch_id>`. Scanning only needs the
//! final path segment, so any absolute URL is accepted on the way back in.

use crate::{Error, Result};

/// Path prefix under which verification pages live.
pub const VERIFY_PATH: &str = "/verify/";

/// Build the verification URL for `batch_id` under `origin`.
pub fn verification_url(origin: &str, batch_id: &str) -> String {
  format!("{}{VERIFY_PATH}{batch_id}", origin.trim_end_matches('/'))
}

/// Extract the batch id from a scanned verification URL.
///
/// The payload must be an absolute URL (`scheme://authority[/path]`). The
/// last segment of its path (query and fragment ignored) is the batch id.
pub fn parse_verification_url(payload: &str) -> Result<String> {
  let payload = payload.trim();
  let (scheme, rest) = payload.split_once("://").ok_or(Error::InvalidQrCode)?;

  let scheme_ok = scheme
    .chars()
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic())
    && scheme
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
  if !scheme_ok {
    return Err(Error::InvalidQrCode);
  }

  let rest = rest.split(['?', '#']).next().unwrap_or_default();
  let (authority, path) = match rest.find('/') {
    Some(i) => rest.split_at(i),
    None => (rest, ""),
  };
  if authority.is_empty() || authority.contains(char::is_whitespace) {
    return Err(Error::InvalidQrCode);
  }

  match path.rsplit('/').next() {
    Some(segment) if !segment.is_empty() => Ok(segment.to_owned()),
    _ => Err(Error::InvalidQrCode),
  }
}
