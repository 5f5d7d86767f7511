//! services/api/src/bin/openapi.rs
//!
//! Dumps the study tracker's OpenAPI document without starting the server.
//!
//! Usage: `openapi [PATH]`. `PATH` defaults to `openapi.json`; `-` prints the
//! document to stdout instead.

use api_lib::web::rest::ApiDoc;
use std::io::Write;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let target = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let document = ApiDoc::openapi().to_pretty_json()?;

    if target == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(document.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        std::fs::write(&target, document)?;
        eprintln!("Wrote API document to {target}");
    }
    Ok(())
}
