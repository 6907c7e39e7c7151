//! Escaping rules for the individual payload schemes.
//!
//! The schemes do not share an escape set: Wi-Fi only protects `\` and `;`,
//! vCard also protects `,` and newlines, and the URI-style schemes use
//! percent-encoding.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left alone by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escape a Wi-Fi SSID or password.
///
/// Only backslash and semicolon are escaped. Commas, quotes and newlines pass
/// through unchanged.
pub fn escape_wifi(value: &str) -> String {
    value.replace('\\', "\\\\").replace(';', "\\;")
}

/// Escape a vCard 3.0 property value.
///
/// Backslash goes first so the escapes inserted by later steps are not
/// escaped again. `\r\n` and bare `\r` line breaks are folded into `\n`.
pub fn escape_vcard(value: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(';', "\\;")
        .replace(',', "\\,")
}

/// Percent-encode a query component (space becomes `%20`, never `+`).
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}
