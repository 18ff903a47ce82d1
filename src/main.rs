//! churn - Main Entry Point
//!
//! Seller churn prediction: train, score, and inspect models from the
//! command line.

use churn_model::cli::{cmd_info, cmd_predict, cmd_train, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churn_model=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            config,
            output,
            reference_date,
            seed,
            n_trials,
            cv_folds,
            test_size,
        } => {
            cmd_train(
                &data,
                config.as_deref(),
                &output,
                reference_date.as_deref(),
                seed,
                n_trials,
                cv_folds,
                test_size,
            )?;
        }
        Commands::Predict { model, data, output } => {
            cmd_predict(&model, &data, &output)?;
        }
        Commands::Info { model } => {
            cmd_info(&model)?;
        }
    }

    Ok(())
}
