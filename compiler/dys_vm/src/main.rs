//! Dys VM CLI
//!
//! Runs one script invocation per process for the ledger node.

use std::io;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use dys_vm::commands::{self, CommandError};
use dys_vm::{Sandbox, SandboxConfig};

#[derive(Parser, Debug)]
#[command(name = "dysvm", version)]
#[command(about = "Run Dys scripts in a gas-metered sandbox")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a script, optionally call one of its functions, and print
    /// the result document
    Exec {
        #[command(flatten)]
        invocation: InvocationArgs,
    },
    /// Answer a raw HTTP request with the script's wsgi application
    Http {
        #[command(flatten)]
        invocation: InvocationArgs,

        /// Raw HTTP/1.1 request text
        #[arg(long)]
        request: String,
    },
}

#[derive(Args, Debug)]
struct InvocationArgs {
    /// Message document (JSON)
    #[arg(long, default_value = "{}")]
    msg: String,

    /// Script record document (JSON)
    #[arg(long)]
    script: String,

    /// Results of the attached messages (JSON list)
    #[arg(long, default_value = "[]")]
    attached: String,

    /// Block header document (JSON)
    #[arg(long, default_value = "{}")]
    block: String,

    /// Port of the node's RPC service; 0 runs offline
    #[arg(long, default_value_t = 0)]
    port: u16,
}

fn run(cli: Cli) -> Result<bool, CommandError> {
    let sandbox = Sandbox::new(SandboxConfig::default());
    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Exec { invocation: args } => {
            let invocation = commands::invocation(&args.msg, &args.script, &args.attached, &args.block)?;
            commands::exec(&sandbox, &invocation, commands::host_for(args.port)?, &mut stdout)
        }
        Command::Http {
            invocation: args,
            request,
        } => {
            let invocation = commands::invocation(&args.msg, &args.script, &args.attached, &args.block)?;
            commands::serve(
                &sandbox,
                &invocation,
                commands::host_for(args.port)?,
                &request,
                &mut stdout,
            )?;
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    dys_vm::init_tracing();
    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(%err, "dysvm failed");
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
