//! Unverified JWT body decoding for display.
//!
//! Nothing here checks signatures; the output is for reading only.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Local, TimeZone};
use regex::{Captures, Regex};

/// Claims holding a Unix timestamp that get a human-readable comment.
pub const EPOCH_CLAIMS: [&str; 4] = ["iat", "nbf", "exp", "xms_tcdt"];

/// Decode the body (middle segment) of a compact JWT.
///
/// Returns `None` if `token` does not have exactly three segments or the
/// body is not base64url-encoded UTF-8. Trailing padding is tolerated.
pub fn decode_body(token: &str) -> Option<String> {
    let mut segments = token.trim().split('.');
    let (Some(_), Some(body), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD.decode(body.trim_end_matches('=')).ok()?;
    String::from_utf8(bytes).ok()
}

/// Re-indent a JSON document, keeping key order.
pub fn pretty_json(json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Append `// 👈 <local time>` after the first occurrence of each claim in
/// `claims` whose value is an integer. Values that are not valid timestamps
/// are left alone.
pub fn annotate_epochs(json: &str, claims: &[&str]) -> String {
    let mut out = json.to_string();
    for claim in claims {
        let Ok(re) = Regex::new(&format!(r#""{}": (\d+),?"#, regex::escape(claim))) else {
            continue;
        };
        out = re
            .replacen(&out, 1, |caps: &Captures| match epoch_to_local(&caps[1]) {
                Some(time) => format!("{} // 👈 {time}", &caps[0]),
                None => caps[0].to_string(),
            })
            .into_owned();
    }
    out
}

/// Decoded, pretty-printed and annotated body of `token`, or `None` if it
/// is not a JWT with a JSON body.
pub fn render(token: &str) -> Option<String> {
    let body = decode_body(token)?;
    let pretty = pretty_json(&body)?;
    Some(annotate_epochs(&pretty, &EPOCH_CLAIMS))
}

fn epoch_to_local(digits: &str) -> Option<String> {
    let secs: i64 = digits.parse().ok()?;
    let time = Local.timestamp_opt(secs, 0).single()?;
    Some(time.format("%Y-%m-%d %H:%M:%S %z").to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn token(body: &str) -> String {
        format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(body))
    }

    #[test]
    fn decodes_middle_segment() {
        let jwt = token(r#"{"sub":"alice"}"#);
        assert_eq!(decode_body(&jwt).as_deref(), Some(r#"{"sub":"alice"}"#));
    }

    #[test]
    fn tolerates_padding() {
        let jwt = format!("h.{}==.s", URL_SAFE_NO_PAD.encode("{\"a\":1}"));
        assert_eq!(decode_body(&jwt).as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn rejects_non_jwts() {
        assert_eq!(decode_body("opaque-access-token"), None);
        assert_eq!(decode_body("a.b"), None);
        assert_eq!(decode_body("a.b.c.d"), None);
        assert_eq!(decode_body("a.!!!.c"), None);
        assert_eq!(render(&format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"))), None);
    }

    #[test]
    fn pretty_json_keeps_order() {
        let pretty = pretty_json(r#"{"z":1,"a":2}"#).unwrap();
        assert!(pretty.find("\"z\"").unwrap() < pretty.find("\"a\"").unwrap());
        assert_eq!(pretty_json("{"), None);
    }

    #[test]
    fn annotates_epoch_claims_only() {
        let json = "{\n  \"iat\": 1700000000,\n  \"sub\": \"123\",\n  \"exp\": 1700003600\n}";
        let annotated = annotate_epochs(json, &EPOCH_CLAIMS);

        let lines: Vec<&str> = annotated.lines().collect();
        assert!(lines[1].starts_with("  \"iat\": 1700000000, // 👈 2023-11-"));
        assert_eq!(lines[2], "  \"sub\": \"123\",");
        assert!(lines[3].starts_with("  \"exp\": 1700003600 // 👈 2023-11-"));
    }

    #[test]
    fn render_pipeline() {
        let rendered = render(&token(r#"{"nbf":0,"name":"x"}"#)).unwrap();
        assert!(rendered.contains("\"nbf\": 0, // 👈 19"));
        assert!(rendered.contains("\"name\": \"x\""));
    }
}
