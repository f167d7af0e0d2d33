use std::process;

use clap::Parser;
use solidity_analyzer::{
    app::{CheckParams, run_check},
    cli::{Cli, Commands},
    error::AppResult,
    output::format_rules_list,
    rules::RuleRegistry
};

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            // Startup failures are usage errors by convention.
            process::exit(2);
        }
    }
}

fn run() -> AppResult<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            paths,
            config,
            output_format,
            fix,
            diff,
            backup,
            max_concurrency,
            cache_dir,
            no_cache,
            verbose,
            quiet,
            no_color
        } => {
            let output = run_check(CheckParams {
                paths,
                config_path: config,
                output_format,
                fix,
                diff,
                backup,
                max_concurrency,
                cache_dir,
                no_cache,
                verbose,
                quiet,
                no_color
            })?;
            for line in &output.stdout {
                println!("{}", line);
            }
            Ok(output.exit_code)
        }
        Commands::Rules {
            no_color
        } => {
            let registry = RuleRegistry::with_builtin_rules();
            println!("{}", format_rules_list(&registry, !no_color));
            Ok(0)
        }
    }
}
