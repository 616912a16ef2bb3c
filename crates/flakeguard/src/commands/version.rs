//! Version command

use anyhow::Result;
use serde::Serialize;

use crate::cli::VersionArgs;

#[derive(Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
}

const INFO: VersionInfo = VersionInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

pub fn run(args: VersionArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&INFO)?);
    } else {
        println!("{} {}", INFO.name, INFO.version);
    }
    Ok(())
}
