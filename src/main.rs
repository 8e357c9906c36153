//! Hatch CLI - stream files in and out of container filesystems

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;

use hatch::cli::{Args, SubCommand};
use hatch::{ContainerHandle, FileStreams, FsFileStreams, HatchError};

fn main() {
    let args = Args::parse();
    hatch::logging::init(args.verbose);

    let json = args.json;
    if let Err(e) = run(args) {
        report_error(&e, json);
        std::process::exit(1);
    }
}

fn report_error(e: &anyhow::Error, json: bool) {
    if !json {
        eprintln!("Error: {:#}", e);
        return;
    }

    let body = match e.downcast_ref::<HatchError>() {
        Some(err) => json!({ "error": err.kind(), "message": err.to_string() }),
        None => json!({ "error": "other", "message": format!("{:#}", e) }),
    };
    eprintln!("{}", body);
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = args.effective_config()?;
    let streams = FsFileStreams::from_config(&config)?;

    match args.command {
        SubCommand::Get { handle, source, output } => {
            let handle = ContainerHandle::from(handle);
            let mut stream = streams.open(&handle, &source)?;

            let copied = match &output {
                Some(path) => {
                    let file = File::create(path)
                        .with_context(|| format!("cannot create {}", path.display()))?;
                    stream.copy_to(&mut BufWriter::new(file))?
                }
                None => {
                    let stdout = io::stdout();
                    let mut lock = stdout.lock();
                    stream.copy_to(&mut lock)?
                }
            };

            // stdout carries the file itself unless it went to a file
            if args.json && output.is_some() {
                println!("{}", json!({ "handle": handle.as_str(), "source": source, "bytes": copied }));
            }
            Ok(())
        }

        SubCommand::Put { handle, destination, input } => {
            let handle = ContainerHandle::from(handle);
            let written = match &input {
                Some(path) => {
                    let mut file = File::open(path)
                        .with_context(|| format!("cannot open {}", path.display()))?;
                    streams.write(&handle, &destination, &mut file)?
                }
                None => {
                    let stdin = io::stdin();
                    let mut lock = stdin.lock();
                    streams.write(&handle, &destination, &mut lock)?
                }
            };

            if args.json {
                println!(
                    "{}",
                    json!({ "handle": handle.as_str(), "destination": destination, "bytes": written })
                );
            } else if args.verbose > 0 {
                eprintln!("Wrote {} to {}:{}", bytesize::ByteSize(written), handle, destination);
            }
            Ok(())
        }

        SubCommand::Resolve { handle, path } => {
            let resolved = streams.resolver().resolve(&ContainerHandle::from(handle), &path)?;
            if args.json {
                println!(
                    "{}",
                    json!({
                        "root": resolved.root(),
                        "relative": resolved.relative(),
                        "path": resolved.path(),
                    })
                );
            } else {
                println!("{}", resolved.path().display());
            }
            Ok(())
        }

        SubCommand::Containers => {
            if config.containers_dir.is_none() {
                bail!("no containers directory configured; pass --containers-dir or set HATCH_CONTAINERS_DIR");
            }

            let handles = streams.resolver().registry().handles()?;
            let mut out = io::stdout().lock();
            if args.json {
                let names: Vec<&str> = handles.iter().map(|h| h.as_str()).collect();
                writeln!(out, "{}", json!(names))?;
            } else {
                for handle in &handles {
                    writeln!(out, "{}", handle)?;
                }
            }
            Ok(())
        }
    }
}
