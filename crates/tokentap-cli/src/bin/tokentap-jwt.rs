//! Decode the body of a JWT without verifying it.
//!
//! ```text
//! tokentap-jwt [--pure] <jwt>
//! echo <jwt> | tokentap-jwt [--pure]
//! ```

use std::io::{IsTerminal, Read};
use std::process::ExitCode;

use clap::Parser;

use tokentap_cli::jwt;

/// Decode the body of a JWT given as argument or on stdin.
#[derive(Parser)]
#[command(name = "tokentap-jwt", version)]
struct Args {
    /// Print the decoded body as-is, without re-formatting or annotations.
    #[arg(long)]
    pure: bool,

    /// The token; read from stdin when omitted.
    token: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let piped = !std::io::stdin().is_terminal();

    let token = match (args.token, piped) {
        (Some(_), true) => {
            eprintln!("Error: cannot accept both piped input and a command line argument");
            return ExitCode::FAILURE;
        }
        (Some(token), false) => token,
        (None, true) => {
            let mut input = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut input) {
                eprintln!("Error reading from stdin: {e}");
                return ExitCode::FAILURE;
            }
            input.trim().to_string()
        }
        (None, false) => {
            eprintln!("Usage: tokentap-jwt [--pure] <jwt>\n   or: echo <jwt> | tokentap-jwt [--pure]");
            return ExitCode::FAILURE;
        }
    };

    let output = if args.pure {
        jwt::decode_body(&token)
    } else {
        jwt::render(&token)
    };

    match output {
        Some(body) => {
            println!("{body}");
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("<not a JWT>");
            ExitCode::FAILURE
        }
    }
}
