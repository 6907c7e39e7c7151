//! # Payload Encoder
//!
//! Pure functions that turn structured form input into the exact string a
//! scanning app expects for each QR payload convention.
//!
//! | Scheme | Output |
//! |--------|--------|
//! | text | trimmed input verbatim |
//! | wifi | `WIFI:T:<sec>;S:<ssid>;P:<pass>;H:<true\|false>;;` |
//! | tel | `tel:<number>` |
//! | email | `mailto:<to>[?subject=..&body=..]` |
//! | sms | `SMSTO:<to>:<body>` (trailing colon kept when body is empty) |
//! | geo | `geo:<lat>,<lng>[?q=..]` |
//! | vcard | vCard 3.0 block, empty properties omitted |
//!
//! Encoding never fails. An empty result means "nothing to render" and it is
//! up to the caller to act on that.
//!
//! ## Example
//!
//! ```
//! use qrdeck::payload::{PayloadRequest, WifiFields};
//!
//! let request = PayloadRequest::Wifi(WifiFields {
//!     ssid: "Cafe;Guest".into(),
//!     password: "p\\w".into(),
//!     security: "WPA".into(),
//!     hidden: false,
//! });
//! assert_eq!(request.encode(), r"WIFI:T:WPA;S:Cafe\;Guest;P:p\\w;H:false;;");
//! ```

pub mod escape;
mod fields;

pub use escape::{encode_uri_component, escape_vcard, escape_wifi};
pub use fields::{FieldMap, FieldValue};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The payload conventions the encoder knows about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    #[default]
    Text,
    Wifi,
    Tel,
    Email,
    Sms,
    Geo,
    Vcard,
}

impl SchemeKind {
    pub const ALL: [SchemeKind; 7] = [
        SchemeKind::Text,
        SchemeKind::Wifi,
        SchemeKind::Tel,
        SchemeKind::Email,
        SchemeKind::Sms,
        SchemeKind::Geo,
        SchemeKind::Vcard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SchemeKind::Text => "text",
            SchemeKind::Wifi => "wifi",
            SchemeKind::Tel => "tel",
            SchemeKind::Email => "email",
            SchemeKind::Sms => "sms",
            SchemeKind::Geo => "geo",
            SchemeKind::Vcard => "vcard",
        }
    }

    /// Form field names read for this scheme.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            SchemeKind::Text => &["text"],
            SchemeKind::Wifi => &["ssid", "password", "security", "hidden"],
            SchemeKind::Tel => &["tel"],
            SchemeKind::Email => &["to", "subject", "body"],
            SchemeKind::Sms => &["to", "body"],
            SchemeKind::Geo => &["lat", "lng", "q"],
            SchemeKind::Vcard => &[
                "name", "org", "title", "tel", "email", "url", "adr", "note",
            ],
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemeKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown payload type '{}'", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFields {
    pub text: String,
}

/// Wi-Fi network credentials.
///
/// `security` is passed through as given (`WPA`, `WEP`, `nopass`).
/// SSID and password are not trimmed: whitespace can be part of either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiFields {
    pub ssid: String,
    pub password: String,
    pub security: String,
    pub hidden: bool,
}

impl Default for WifiFields {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            security: "WPA".to_string(),
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelFields {
    pub tel: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailFields {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmsFields {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoFields {
    pub lat: String,
    pub lng: String,
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcardFields {
    pub name: String,
    pub org: String,
    pub title: String,
    pub tel: String,
    pub email: String,
    pub url: String,
    pub adr: String,
    pub note: String,
}

/// Structured input for one payload, tagged by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadRequest {
    Text(TextFields),
    Wifi(WifiFields),
    Tel(TelFields),
    Email(EmailFields),
    Sms(SmsFields),
    Geo(GeoFields),
    Vcard(VcardFields),
}

impl PayloadRequest {
    pub fn kind(&self) -> SchemeKind {
        match self {
            PayloadRequest::Text(_) => SchemeKind::Text,
            PayloadRequest::Wifi(_) => SchemeKind::Wifi,
            PayloadRequest::Tel(_) => SchemeKind::Tel,
            PayloadRequest::Email(_) => SchemeKind::Email,
            PayloadRequest::Sms(_) => SchemeKind::Sms,
            PayloadRequest::Geo(_) => SchemeKind::Geo,
            PayloadRequest::Vcard(_) => SchemeKind::Vcard,
        }
    }

    /// Build a typed request from loose form state.
    ///
    /// Missing fields read as empty strings; a missing Wi-Fi security mode
    /// defaults to `WPA`.
    pub fn from_fields(kind: SchemeKind, fields: &FieldMap) -> Self {
        let text = |name: &str| fields.text(name).to_string();
        match kind {
            SchemeKind::Text => PayloadRequest::Text(TextFields { text: text("text") }),
            SchemeKind::Wifi => PayloadRequest::Wifi(WifiFields {
                ssid: text("ssid"),
                password: text("password"),
                security: fields.get("security").unwrap_or("WPA").to_string(),
                hidden: fields.flag("hidden"),
            }),
            SchemeKind::Tel => PayloadRequest::Tel(TelFields { tel: text("tel") }),
            SchemeKind::Email => PayloadRequest::Email(EmailFields {
                to: text("to"),
                subject: text("subject"),
                body: text("body"),
            }),
            SchemeKind::Sms => PayloadRequest::Sms(SmsFields {
                to: text("to"),
                body: text("body"),
            }),
            SchemeKind::Geo => PayloadRequest::Geo(GeoFields {
                lat: text("lat"),
                lng: text("lng"),
                query: text("q"),
            }),
            SchemeKind::Vcard => PayloadRequest::Vcard(VcardFields {
                name: text("name"),
                org: text("org"),
                title: text("title"),
                tel: text("tel"),
                email: text("email"),
                url: text("url"),
                adr: text("adr"),
                note: text("note"),
            }),
        }
    }

    /// Produce the canonical payload string.
    pub fn encode(&self) -> String {
        match self {
            PayloadRequest::Text(f) => f.text.trim().to_string(),
            PayloadRequest::Wifi(f) => encode_wifi(f),
            PayloadRequest::Tel(f) => format!("tel:{}", f.tel.trim()),
            PayloadRequest::Email(f) => encode_email(f),
            PayloadRequest::Sms(f) => format!("SMSTO:{}:{}", f.to.trim(), f.body.trim()),
            PayloadRequest::Geo(f) => encode_geo(f),
            PayloadRequest::Vcard(f) => encode_vcard(f),
        }
    }
}

/// Encode loose form state for a scheme given by name.
///
/// Unknown scheme names produce an empty string.
pub fn encode_fields(kind: &str, fields: &FieldMap) -> String {
    match kind.parse::<SchemeKind>() {
        Ok(kind) => PayloadRequest::from_fields(kind, fields).encode(),
        Err(_) => String::new(),
    }
}

fn encode_wifi(f: &WifiFields) -> String {
    let hidden = if f.hidden { "true" } else { "false" };
    format!(
        "WIFI:T:{};S:{};P:{};H:{};;",
        f.security,
        escape_wifi(&f.ssid),
        escape_wifi(&f.password),
        hidden
    )
}

fn encode_email(f: &EmailFields) -> String {
    let to = f.to.trim();
    let subject = f.subject.trim();
    let body = f.body.trim();

    let mut params = Vec::with_capacity(2);
    if !subject.is_empty() {
        params.push(format!("subject={}", encode_uri_component(subject)));
    }
    if !body.is_empty() {
        params.push(format!("body={}", encode_uri_component(body)));
    }

    if params.is_empty() {
        format!("mailto:{}", to)
    } else {
        format!("mailto:{}?{}", to, params.join("&"))
    }
}

fn encode_geo(f: &GeoFields) -> String {
    let lat = f.lat.trim();
    let lng = f.lng.trim();
    let query = f.query.trim();
    if query.is_empty() {
        format!("geo:{},{}", lat, lng)
    } else {
        format!("geo:{},{}?q={}", lat, lng, encode_uri_component(query))
    }
}

fn encode_vcard(f: &VcardFields) -> String {
    let properties = [
        ("FN", &f.name),
        ("ORG", &f.org),
        ("TITLE", &f.title),
        ("TEL;TYPE=CELL", &f.tel),
        ("EMAIL", &f.email),
        ("URL", &f.url),
        ("ADR", &f.adr),
        ("NOTE", &f.note),
    ];

    let mut lines = vec!["BEGIN:VCARD".to_string(), "VERSION:3.0".to_string()];
    for (property, value) in properties {
        let escaped = escape_vcard(value.trim());
        if !escaped.is_empty() {
            lines.push(format!("{}:{}", property, escaped));
        }
    }
    lines.push("END:VCARD".to_string());
    lines.join("\n")
}

/// True for absolute `http:` / `https:` URLs.
///
/// Used to hint that a text payload or a scan result is a scannable link.
pub fn looks_like_url(text: &str) -> bool {
    let value = text.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
        return false;
    }

    let Some(rest) = rest.strip_prefix("//") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority.rsplit('@').next().unwrap_or("");
    let host = host.split(':').next().unwrap_or("");
    !host.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_is_trimmed() {
        let req = PayloadRequest::Text(TextFields {
            text: "  https://example.com \n".into(),
        });
        assert_eq!(req.encode(), "https://example.com");
        assert_eq!(encode_fields("text", &FieldMap::new()), "");
    }

    #[test]
    fn test_wifi_payload() {
        let fields = FieldMap::new()
            .with("ssid", "My;Net,work")
            .with("password", r"se\cret")
            .with("security", "WEP")
            .with_flag("hidden", true);
        assert_eq!(
            encode_fields("wifi", &fields),
            r"WIFI:T:WEP;S:My\;Net,work;P:se\\cret;H:true;;"
        );
    }

    #[test]
    fn test_wifi_defaults_and_nopass() {
        assert_eq!(
            encode_fields("wifi", &FieldMap::new().with("ssid", "Home")),
            "WIFI:T:WPA;S:Home;P:;H:false;;"
        );
        let open = FieldMap::new().with("ssid", "Open").with("security", "nopass");
        assert_eq!(encode_fields("wifi", &open), "WIFI:T:nopass;S:Open;P:;H:false;;");
    }

    #[test]
    fn test_tel() {
        let fields = FieldMap::new().with("tel", " +86 123 ");
        assert_eq!(encode_fields("tel", &fields), "tel:+86 123");
    }

    #[test]
    fn test_email_without_query() {
        let fields = FieldMap::new()
            .with("to", " a@example.com ")
            .with("subject", "  ")
            .with("body", "");
        assert_eq!(encode_fields("email", &fields), "mailto:a@example.com");
    }

    #[test]
    fn test_email_with_query() {
        let fields = FieldMap::new().with("to", "a@example.com").with("subject", "A B");
        assert_eq!(
            encode_fields("email", &fields),
            "mailto:a@example.com?subject=A%20B"
        );

        let fields = FieldMap::new()
            .with("to", "a@example.com")
            .with("subject", "Hi")
            .with("body", "x&y");
        assert_eq!(
            encode_fields("email", &fields),
            "mailto:a@example.com?subject=Hi&body=x%26y"
        );

        let body_only = FieldMap::new().with("to", "a@example.com").with("body", "yo");
        assert_eq!(encode_fields("email", &body_only), "mailto:a@example.com?body=yo");
    }

    #[test]
    fn test_sms_keeps_trailing_colon() {
        let fields = FieldMap::new().with("to", "+100").with("body", "   ");
        assert_eq!(encode_fields("sms", &fields), "SMSTO:+100:");

        let fields = FieldMap::new().with("to", "+100").with("body", " hi there ");
        assert_eq!(encode_fields("sms", &fields), "SMSTO:+100:hi there");
    }

    #[test]
    fn test_geo() {
        let fields = FieldMap::new().with("lat", "31.2304").with("lng", " 121.4737");
        assert_eq!(encode_fields("geo", &fields), "geo:31.2304,121.4737");

        let fields = fields.with("q", "coffee shop");
        assert_eq!(
            encode_fields("geo", &fields),
            "geo:31.2304,121.4737?q=coffee%20shop"
        );
    }

    #[test]
    fn test_vcard_full() {
        let fields = FieldMap::new()
            .with("name", "Doe, Jane")
            .with("org", "ACME; Inc")
            .with("tel", "+1 555")
            .with("note", "line1\nline2 \\ end");
        assert_eq!(
            encode_fields("vcard", &fields),
            "BEGIN:VCARD\n\
             VERSION:3.0\n\
             FN:Doe\\, Jane\n\
             ORG:ACME\\; Inc\n\
             TEL;TYPE=CELL:+1 555\n\
             NOTE:line1\\nline2 \\\\ end\n\
             END:VCARD"
        );
    }

    #[test]
    fn test_vcard_empty_omits_all_properties() {
        assert_eq!(
            encode_fields("vcard", &FieldMap::new().with("url", "   ")),
            "BEGIN:VCARD\nVERSION:3.0\nEND:VCARD"
        );
    }

    #[test]
    fn test_unknown_scheme_is_empty() {
        assert_eq!(encode_fields("bitcoin", &FieldMap::new().with("text", "x")), "");
    }

    #[test]
    fn test_scheme_kind_parse() {
        assert_eq!("VCard".parse::<SchemeKind>(), Ok(SchemeKind::Vcard));
        assert!("fax".parse::<SchemeKind>().is_err());
        for kind in SchemeKind::ALL {
            assert_eq!(kind.name().parse::<SchemeKind>(), Ok(kind));
            assert!(!kind.field_names().is_empty());
        }
    }

    #[test]
    fn test_looks_like_url() {
        assert!(looks_like_url("https://example.com"));
        assert!(looks_like_url(" HTTP://example.com/a?b#c "));
        assert!(looks_like_url("http://user@host:8080/x"));
        assert!(!looks_like_url("ftp://example.com"));
        assert!(!looks_like_url("https://"));
        assert!(!looks_like_url("https://exa mple.com"));
        assert!(!looks_like_url("mailto:a@b.c"));
        assert!(!looks_like_url(""));
    }
}
