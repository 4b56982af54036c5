//! signapk-bootstrap CLI - inspect and exercise provider bootstrap.
//!
//! Shows what the signing tool would see on this host: platform, sandbox,
//! bundled native library, working directory and the provider chain.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use signapk_bootstrap::{
    native, platform, sandbox, BootstrapConfig, BootstrapError, Capability, HostEnvironment,
};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Inspect and exercise signapk's crypto provider bootstrap.
#[derive(Parser)]
#[command(name = "signapk-bootstrap")]
#[command(version = VERSION)]
#[command(about = "Crypto provider bootstrap diagnostics for signapk")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show platform, sandbox, bundled library and working directory
    Info,

    /// Run the provider fallback chain and report the active provider
    Activate {
        /// Fail unless the active provider offers this capability
        #[arg(long)]
        require: Option<Capability>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}

fn fail(err: &BootstrapError, json: bool) -> ExitCode {
    if json {
        print_json(&serde_json::json!({ "error": err.to_string(), "fatal": err.is_fatal() }));
    } else {
        eprintln!("Error: {}", err);
    }
    ExitCode::FAILURE
}

fn run_info(json: bool) -> ExitCode {
    let env = HostEnvironment::capture();
    let signature = platform::identify(&env.os_name, &env.arch);
    let descriptor = signature.and_then(native::lookup);
    let sandbox = sandbox::inspect(&env);

    let workdir = match signapk_bootstrap::workdir::WorkdirResolver::new(
        env.clone(),
        BootstrapConfig::default(),
    )
    .resolve()
    {
        Ok(dir) => dir,
        Err(e) => return fail(&e, json),
    };

    if json {
        print_json(&serde_json::json!({
            "os": env.os_name,
            "arch": env.arch,
            "platform": signature,
            "native_library": descriptor,
            "sandbox": sandbox,
            "working_directory": workdir,
        }));
        return ExitCode::SUCCESS;
    }

    println!("OS / arch:          {} / {}", env.os_name, env.arch);
    match signature {
        Some(sig) => println!("Platform:           {}", sig),
        None => println!("Platform:           unrecognized"),
    }
    match descriptor {
        Some(d) => println!("Native library:     {}", d.resource_path),
        None => println!("Native library:     none bundled for this platform"),
    }
    match sandbox {
        Some(report) => println!("Sandbox:            {} ({})", report.kind, report.indicator),
        None => println!("Sandbox:            none"),
    }
    println!("Working directory:  {}", workdir.path.display());
    for candidate in &workdir.probed {
        let verdict = match candidate.writable {
            Some(true) => "ok",
            Some(false) => "unwritable",
            None => "not probed",
        };
        println!(
            "  [{}] {:?} {} ({})",
            candidate.priority,
            candidate.source,
            candidate.path.display(),
            verdict
        );
    }
    ExitCode::SUCCESS
}

fn run_activate(require: Option<Capability>, json: bool) -> ExitCode {
    let boot = match signapk_bootstrap::bootstrap() {
        Ok(boot) => boot,
        Err(e) => return fail(&e, json),
    };
    let native_state = signapk_bootstrap::native_loader().state();

    let required = match require {
        Some(capability) => match boot.chain.require(capability) {
            Ok(_) => Some(capability),
            Err(e) => return fail(&e, json),
        },
        None => None,
    };

    if json {
        print_json(&serde_json::json!({
            "working_directory": boot.working_directory.path,
            "message": boot.working_directory.message(),
            "native_load_state": native_state,
            "active": {
                "name": boot.provider.name(),
                "kind": boot.provider.kind(),
                "capabilities": boot.provider.capabilities(),
            },
            "registrations": boot.chain.registrations(),
            "required": required,
        }));
        return ExitCode::SUCCESS;
    }

    println!("{}", boot.working_directory.message());
    println!("Native load state:  {:?}", native_state);
    println!(
        "Active provider:    {} ({:?})",
        boot.provider.name(),
        boot.provider.kind()
    );
    for registration in boot.chain.registrations() {
        println!(
            "  [{:>3}] {:<12} {:?}",
            registration.priority, registration.name, registration.status
        );
    }
    if let Some(capability) = required {
        println!("Required capability {} is available", capability);
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json = cli.format.eq_ignore_ascii_case("json");

    match cli.command.unwrap_or(Commands::Info) {
        Commands::Info => run_info(json),
        Commands::Activate { require } => run_activate(require, json),
    }
}
