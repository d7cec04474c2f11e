//! Restore files from a device backup into a local file.
//!
//! Usage:
//!   cargo run --example restore -- --host URL --username USER --password PASS \
//!       --device GUID --out FILE [--config FILE] [--proxy PROXY] \
//!       [--destination GUID] [--archive-password PASS] [--skip-size] PATH...
//!
//! A single file is written as-is; directories and multiple paths arrive as a
//! zip archive.

mod cli;

use archivelib::progress::log_progress;
use archivelib::RestoreOptions;
use cli::{usage_and_exit, Account, ArgParser};
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "Usage: cargo run --example restore -- --host URL --username USER \
--password PASS --device GUID --out FILE [--config FILE] [--proxy PROXY] \
[--destination GUID] [--archive-password PASS] [--skip-size] PATH...";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("archivelib=debug"));
    fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let mut parser = ArgParser::new(USAGE);
    let account = Account::from_parser(&mut parser);
    let device_guid = parser.require(&["--device", "-d"]);
    let out = parser.require(&["--out", "-o"]);
    let options = RestoreOptions {
        destination_guid: parser.take_value(&["--destination"]),
        archive_password: parser.take_value(&["--archive-password"]),
        encryption_key: None,
        ignore_size_calc: parser.take_flag("--skip-size"),
    };
    let paths = parser.remaining();
    if paths.is_empty() {
        usage_and_exit(USAGE);
    }

    let sdk = match account.login().await {
        Ok(sdk) => sdk,
        Err(e) => {
            eprintln!("Login failed: {e}");
            std::process::exit(1);
        }
    };

    let stream = match sdk
        .archive()
        .stream_from_backup(paths.clone(), &device_guid, &options)
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Restore failed: {e}");
            std::process::exit(1);
        }
    };

    let mut file = match tokio::fs::File::create(&out).await {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot create {out}: {e}");
            std::process::exit(1);
        }
    };
    match stream
        .write_to_with_progress(&mut file, &paths[0], log_progress())
        .await
    {
        Ok(written) => println!("Restored {} path(s) to {out} ({written} bytes)", paths.len()),
        Err(e) => {
            eprintln!("Download failed: {e}");
            std::process::exit(1);
        }
    }
}
