//! Printing obtained tokens.
//!
//! Stdout carries only the token output; diagnostics go to stderr through
//! `tracing`.

use std::io::Write;

use tokentap_auth::{TokenSet, TokenSink};

use crate::jwt;

/// Prints the token payload as pretty JSON, plus decoded JWT bodies when
/// verbose.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    pub verbose: bool,
}

impl TokenSink for StdoutSink {
    fn deliver(&self, tokens: &TokenSet) {
        let text = render(tokens, self.verbose);
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{text}").and_then(|()| stdout.flush()) {
            tracing::error!(error = %e, "could not write tokens to stdout");
        }
    }
}

/// The text [`StdoutSink`] prints for `tokens`.
pub fn render(tokens: &TokenSet, verbose: bool) -> String {
    let mut out = tokens.to_pretty_json();
    if !verbose {
        return out;
    }

    out.push_str(&format!(
        "\n\nSuccessful operation, received tokens expire in {}\n",
        friendly_duration(tokens.expires_in)
    ));

    let tokens = [
        ("Access token", Some(tokens.access_token.as_str())),
        ("ID token", tokens.id_token.as_deref()),
    ];
    for (label, token) in tokens {
        if let Some(body) = token.and_then(jwt::render) {
            let rule = "-".repeat(label.len() + 1);
            out.push_str(&format!("\n{label}:\n{rule}\n{body}\n"));
        }
    }
    out
}

/// `3725` -> `"1 hour, 2 minutes and 5 seconds"`.
pub fn friendly_duration(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;

    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{}, ", plural(h, "hour")));
    }
    if h > 0 || m > 0 {
        out.push_str(&format!("{} and ", plural(m, "minute")));
    }
    out.push_str(&plural(s, "second"));
    out
}

fn plural(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("{value} {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
