//! The managed-config header and the first-line rewrite.

use crate::config::StorageTarget;

/// Re-fetch interval embedded in every published profile, in seconds.
pub const MANAGED_CONFIG_INTERVAL_SECS: u64 = 86_400;

/// Public URL of an object: `https://<bucket>.<region>.<endpoint>/<key>`.
pub fn public_url(target: &StorageTarget, key: &str) -> String {
    format!(
        "https://{}.{}.{}/{}",
        target.bucket, target.region, target.endpoint, key
    )
}

pub fn managed_config_header(url: &str) -> String {
    format!("#!MANAGED-CONFIG {url} interval={MANAGED_CONFIG_INTERVAL_SECS}")
}

/// Replaces line 0 of `content` with `header`.
///
/// Lines are split on `\n` only, so everything after the first newline
/// (including `\r` characters and a trailing newline) is kept byte for byte.
pub fn rewrite_first_line(content: &str, header: &str) -> String {
    match content.split_once('\n') {
        Some((_, rest)) => {
            let mut out = String::with_capacity(header.len() + 1 + rest.len());
            out.push_str(header);
            out.push('\n');
            out.push_str(rest);
            out
        }
        None => header.to_string(),
    }
}
