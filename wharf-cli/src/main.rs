//! wharf CLI
//!
//! Builds a project's source directories into memory, then requests the
//! given URLs through the middleware and prints what would be served.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use tracing::info;
use wharf_api::logging::{self, LogFormat};
use wharf_api::{Coordinator, Handled, LogLevel, Request, Response};

mod compiler;
mod project;

use crate::compiler::{DirectoryCompiler, DirectoryTarget};
use crate::project::{read_project_file, resolve_source_dir};

#[derive(Parser)]
#[command(
    name = "wharf",
    about = "Build a project into memory and serve URLs from it",
    version
)]
struct Cli {
    /// Project file path
    #[arg(short, long, value_name = "PROJECT", default_value = "wharf.json")]
    project: PathBuf,

    /// URLs to request once the build has settled
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Range header sent with every request, e.g. "bytes=0-99"
    #[arg(long)]
    range: Option<String>,

    /// Force a rebuild before requesting
    #[arg(long)]
    rebuild: bool,

    /// Print response bodies
    #[arg(long)]
    body: bool,

    /// Override the project's log level
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log format: pretty, compact or json
    #[arg(long, value_name = "FORMAT", default_value = "compact")]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let project = match read_project_file(&cli.project) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut config = project.middleware;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Err(e) = logging::init_with_file(config.log_level, cli.log_format, cli.log_file.as_ref())
    {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let targets = project
        .targets
        .iter()
        .map(|target| DirectoryTarget {
            config: target.to_target_config(),
            source: resolve_source_dir(&cli.project, &target.source),
        })
        .collect();
    let compiler = Arc::new(DirectoryCompiler::new(targets));

    let coordinator = match Coordinator::builder(compiler).config(config).start() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    coordinator.run_until_idle();

    if cli.rebuild {
        coordinator.invalidate(|stats| {
            info!(target: "wharf::cli", hash = stats.hash.as_deref().unwrap_or("-"), "rebuilt");
        });
        coordinator.run_until_idle();
    }

    let mut failed = false;
    for url in &cli.urls {
        let mut request = Request::new(cli.method.clone(), url.clone());
        if let Some(range) = &cli.range {
            request = request.with_header("Range", range.clone());
        }
        match serve(&coordinator, request) {
            Some(response) => {
                print_response(url, &response, cli.body);
                failed |= response.status >= 400;
            }
            None => {
                println!("{} -> not served (pass-through)", url);
                failed = true;
            }
        }
    }

    let closed = Arc::new(Mutex::new(None));
    let sink = closed.clone();
    coordinator.close(move |result| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(result);
        }
    });
    coordinator.run_until_idle();
    if let Ok(mut slot) = closed.lock() {
        if let Some(Err(e)) = slot.take() {
            eprintln!("Error: {}", e);
            failed = true;
        }
    }

    if failed {
        process::exit(1);
    }
}

/// Offer `request` to the coordinator and wait for the answer
fn serve(coordinator: &Coordinator, request: Request) -> Option<Response> {
    let slot = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    let handled = coordinator.handle(request, move |response| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(response);
        }
    });
    if handled == Handled::PassThrough {
        return None;
    }

    coordinator.run_until_idle();
    let response = slot.lock().ok()?.take();
    response
}

fn print_response(url: &str, response: &Response, body: bool) {
    println!("{} -> {}", url, response.status);
    for (name, value) in &response.headers {
        println!("  {}: {}", name, value);
    }
    println!("  ({} bytes)", response.body.len());
    if body {
        println!("{}", String::from_utf8_lossy(&response.body));
    }
}
