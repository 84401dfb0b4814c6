use std::io::{self, Write};
use std::sync::Arc;

use crossterm::style::Stylize;
use quizbench::records::{durations_file, load_records, save_questions, write_durations};
use quizbench::{BatchReport, Dispatcher, GeneratedQuestion, ModelClient, SourceRecord};

use crate::config::BatchConfig;

/// Mode 1: one question per passage, written in input order.
pub async fn create_questions(
    client: Arc<dyn ModelClient>,
    batch: &BatchConfig,
    dispatcher: impl FnOnce(Arc<dyn ModelClient>) -> Dispatcher,
) -> anyhow::Result<()> {
    log::info!("Loading passages from {}", batch.source_file.display());
    let records: Vec<SourceRecord> = load_records(&batch.source_file)?;
    let generated = dispatcher(client).generate_questions(records).await?;
    save_questions(&batch.questions_output, &generated.questions)?;
    log::info!(
        "Saved {} questions to {} ({} retries)",
        generated.questions.len(),
        batch.questions_output.display(),
        generated.retries
    );
    Ok(())
}

/// Modes 2 and 3: answers the first `limit` questions and records per-item latency.
pub async fn answer_questions(
    dispatcher: Dispatcher,
    batch: &BatchConfig,
    limit: usize,
    label: &str,
) -> anyhow::Result<BatchReport> {
    let mut questions: Vec<GeneratedQuestion> = load_records(&batch.questions_input)?;
    questions.truncate(limit);
    let count = questions.len();
    log::info!(
        "Answering {count} questions from {} with {label}",
        batch.questions_input.display()
    );

    let report = dispatcher.answer_questions(questions).await?;
    let path = durations_file(&batch.results_dir, count, label);
    write_durations(&path, &report.samples)?;
    log::info!("Wrote {} durations to {}", report.samples.len(), path.display());

    print_report(&mut io::stdout().lock(), &report, label)?;
    Ok(report)
}

pub fn print_report(out: &mut impl Write, report: &BatchReport, label: &str) -> io::Result<()> {
    let count = report.attempted;
    let average = report
        .average()
        .map_or_else(|| "n/a".to_string(), |avg| avg.to_string());
    let lines = [
        format!("Finished Processing {count} questions using {label}"),
        format!("Total   Processing Time - Sum of {count} requests (sec): {}", report.total()),
        format!("Average Processing Time - Avg of {count} requests (sec): {average}"),
        format!(
            "Total   Processing Time - Time to process (logic & retries) (sec): {}",
            report.elapsed.as_secs_f64()
        ),
        format!("Total   Number of HTTP Retries: {}", report.retries),
    ];
    writeln!(out)?;
    for line in lines {
        writeln!(out, "{}", line.green())?;
    }
    if !report.failures.is_empty() {
        writeln!(
            out,
            "{}",
            format!("Failed: {} of {count}", report.failures.len()).red()
        )?;
        for failure in &report.failures {
            writeln!(out, "{}", format!("  {}: {}", failure.id, failure.error).red())?;
        }
    }
    writeln!(out)
}
