use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use reclass_classifier::{Classifier, ClassificationRequest, HttpCapability, RetryPolicy};
use reclass_engine::{BatchScheduler, Orchestrator, RunOutcome, RunReport};
use reclass_observability::LogFormat;
use reclass_store::{PostgresProgressStore, ProgressStore, import_csv};
use reclass_taxonomy::TaxonomyCatalog;

mod cli;
mod config;

use cli::{Cli, Commands, RunArgs};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    reclass_observability::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Plain
    });
    let config = Config::from_env();

    match cli.command {
        Commands::Setup => setup(&config).await,
        Commands::Import { file } => import(&config, &file).await,
        Commands::Classify(args) => classify(&config, args, false).await,
        Commands::ReprocessErrors(args) => classify(&config, args, true).await,
        Commands::Report => report(&config).await,
        Commands::TestOne { name, category } => test_one(&config, name, category).await,
    }
}

async fn connect(config: &Config) -> Result<PostgresProgressStore> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(config.database_url()?)
        .await
        .context("failed to connect to the database")?;
    Ok(PostgresProgressStore::new(pool))
}

async fn setup(config: &Config) -> Result<()> {
    let store = connect(config).await?;
    store.create_schema().await?;
    println!("schema ready");
    Ok(())
}

async fn import(config: &Config, file: &Path) -> Result<()> {
    let store = connect(config).await?;
    let imported = import_csv(&store, file).await?;
    println!("imported {imported} products from {}", file.display());
    Ok(())
}

async fn classify(config: &Config, args: RunArgs, reprocess: bool) -> Result<()> {
    let store = connect(config).await?;
    let catalog = TaxonomyCatalog::builtin();
    let capability = HttpCapability::new(config.capability()?, &catalog)?;
    let classifier = Classifier::new(capability, catalog);
    let scheduler = BatchScheduler::new(args.batch_size, Duration::from_secs_f64(args.delay))?
        .with_item_delay(Duration::from_millis(args.item_delay_ms));

    let orchestrator = Orchestrator::new(classifier, store, scheduler).with_retry_policy(
        RetryPolicy::exponential(
            args.max_attempts,
            Duration::from_secs(1),
            Duration::from_secs(30),
        ),
    );

    // Ctrl-C finishes the in-flight product, persists it, then stops.
    let signal = orchestrator.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested, finishing the in-flight product");
            signal.request_stop();
        }
    });

    let report = if reprocess {
        orchestrator.reprocess_errors().await
    } else {
        orchestrator.run().await
    };
    print_run_report(&report);

    if let RunOutcome::Aborted { reason } = &report.outcome {
        bail!("run aborted: {reason}");
    }
    Ok(())
}

fn print_run_report(report: &RunReport) {
    let outcome = match &report.outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::Stopped => "stopped",
        RunOutcome::Aborted { .. } => "aborted",
    };
    println!("run {} {outcome}", report.run_id);
    println!(
        "  processed {} in {} batches ({} completed, {} errored, {} retries)",
        report.stats.processed,
        report.stats.batches,
        report.stats.completed,
        report.stats.errored,
        report.stats.retries,
    );
    if report.stats.storage_failures > 0 {
        println!(
            "  {} outcomes were not persisted and stay pending",
            report.stats.storage_failures
        );
    }
    if let Some(avg) = report.stats.avg_confidence() {
        println!("  avg confidence {avg:.2}");
    }
    println!(
        "  tokens {} in / {} out (~${:.2})",
        report.stats.input_tokens, report.stats.output_tokens, report.estimated_cost
    );
    println!("  elapsed {:.1}s", report.elapsed.as_secs_f64());
}

async fn report(config: &Config) -> Result<()> {
    let store = connect(config).await?;
    let stats = store.stats().await?;

    println!("products: {}", stats.total);
    println!("  pending   {}", stats.pending);
    println!("  completed {}", stats.completed);
    println!("  errored   {}", stats.errored);
    if stats.total > 0 {
        println!(
            "  progress  {:.1}%",
            stats.completed as f64 / stats.total as f64 * 100.0
        );
    }
    if let Some(avg) = stats.avg_confidence {
        println!("  avg confidence {avg:.2}");
    }

    let distribution = store.category_distribution().await?;
    if !distribution.is_empty() {
        println!("\ncategory distribution:");
        for row in distribution {
            println!(
                "  {} {:<45} {:>6}  (avg {:.2})",
                row.category_code, row.category_name, row.count, row.avg_confidence
            );
        }
    }
    Ok(())
}

async fn test_one(config: &Config, name: String, category: Option<String>) -> Result<()> {
    let catalog = TaxonomyCatalog::builtin();
    let capability = HttpCapability::new(config.capability()?, &catalog)?;
    let classifier = Classifier::new(capability, catalog);

    let request = ClassificationRequest::ad_hoc(name, category);
    let classified = classifier.classify_request(&request).await?;
    let c = &classified.classification;

    println!(
        "{} > {} > {}",
        c.department_name, c.category_name, c.subcategory_name
    );
    println!(
        "codes {} / {} / {}  confidence {:.2}",
        c.department_code, c.category_code, c.subcategory_code,
        c.confidence()
    );
    if let Some(usage) = classified.usage {
        println!(
            "tokens {} in / {} out",
            usage.input_tokens, usage.output_tokens
        );
    }
    Ok(())
}
