use anyhow::Result;
use clap::Parser;

use parallel_lab::cli::{
    execute_fib, execute_grayscale, execute_text, execute_worker, exit_code, resolve_config, Cli,
    Commands, FibOptions, GrayscaleOptions, TextOptions,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("❌ エラー: {error:#}");
        std::process::exit(exit_code(&error));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        preset,
        config,
        quiet,
        command,
    } = cli;
    let resolve = || resolve_config(preset, config.as_deref(), quiet);

    match command {
        // ワーカーは設定不要。stdoutにも何も出さない
        Commands::Worker { kind } => execute_worker(&kind).await,
        Commands::Fib {
            count,
            algorithm,
            backend,
            workers,
            deadline_secs,
            json,
        } => {
            let options = FibOptions {
                count,
                algorithm,
                backend,
                workers,
                deadline_secs,
                json,
            };
            execute_fib(options, &resolve()?).await
        }
        Commands::Grayscale {
            directory,
            sequential,
            workers,
            recursive,
        } => {
            println!("🚀 グレースケール変換: {}", directory.display());
            let options = GrayscaleOptions {
                directory,
                sequential,
                workers,
                recursive,
            };
            execute_grayscale(options, &resolve()?).await
        }
        Commands::Text {
            input,
            output,
            capacity,
            sequential,
            skip_errors,
            compare,
        } => {
            let options = TextOptions {
                input,
                output,
                capacity,
                sequential,
                skip_errors,
                compare,
            };
            execute_text(options, &resolve()?).await
        }
    }
}
