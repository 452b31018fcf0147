//! The `examforge import` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::Table;

use examforge_core::bulk::{BatchReport, BulkOutcome, ImportProgress};
use examforge_core::error::StoreError;
use examforge_core::form::{FormAction, QuestionForm};
use examforge_core::model::{RecordId, Surface};
use examforge_core::qcm::QcmForm;
use examforge_core::submit::Submitted;
use examforge_core::traits::QuestionStore;
use examforge_store::{create_store, load_config_from, ExamforgeConfig, MemoryStore};

/// Prints batch progress to stderr.
struct ConsoleProgress;

impl ImportProgress for ConsoleProgress {
    fn on_progress(&self, current: usize, total: usize) {
        eprintln!("  [{current}/{total}] submitted");
    }

    fn on_item_failed(&self, position: usize, error: &StoreError) {
        eprintln!("  [{position}] FAILED: {error}");
    }
}

pub async fn execute(
    surface: Surface,
    file: PathBuf,
    target: RecordId,
    config_path: Option<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store: Box<dyn QuestionStore> = if dry_run {
        Box::new(MemoryStore::new())
    } else {
        create_store(&config.store)?
    };
    let text = super::read_input(&file)?;
    tracing::debug!(%surface, target, dry_run, store = store.name(), "import starting");

    println!(
        "Importing {} into {surface} {} {target} (store: {})",
        file.display(),
        surface.filter_label(),
        store.name()
    );

    match surface {
        Surface::Qcm => import_qcm(&config, &text, target, store.as_ref()).await,
        Surface::Questions | Surface::Essays => {
            import_question(&config, surface, text, target, store.as_ref()).await
        }
    }
}

async fn import_question(
    config: &ExamforgeConfig,
    surface: Surface,
    text: String,
    exam_id: RecordId,
    store: &dyn QuestionStore,
) -> Result<()> {
    let form = match surface {
        Surface::Essays => QuestionForm::for_essays(),
        _ => QuestionForm::for_questions(),
    };
    let mut form = form.with_confirmation_ttl(Duration::from_millis(config.confirmation_ms));

    form.apply(FormAction::ImportSingle(text))?;
    if let Some(notice) = form.notice() {
        println!("{notice} ({})", form.record().kind());
    }

    let submitted = form
        .submit(store, exam_id)
        .await
        .context("failed to save question")?;
    print_submitted(&submitted);
    Ok(())
}

async fn import_qcm(
    config: &ExamforgeConfig,
    text: &str,
    chapter_id: RecordId,
    store: &dyn QuestionStore,
) -> Result<()> {
    let mut form = QcmForm::new().with_notice_ttls(
        Duration::from_millis(config.confirmation_ms),
        Duration::from_millis(config.summary_ms),
    );

    match form.import_bulk(text, chapter_id, store, &ConsoleProgress).await? {
        BulkOutcome::Single(_) => {
            if let Some(notice) = form.notice() {
                println!("{notice}");
            }
            let submitted = form
                .submit(store, chapter_id)
                .await
                .context("failed to save QCM question")?;
            print_submitted(&submitted);
            Ok(())
        }
        BulkOutcome::Batch(report) => {
            print_report(&report);
            if let Some(notice) = form.notice() {
                println!("{notice}");
            }
            if report.auth_failed {
                anyhow::bail!("the store refused the credentials; check EXAMFORGE_TOKEN");
            }
            if report.ledger.error_count() > 0 {
                anyhow::bail!(
                    "{} of {} question(s) could not be saved",
                    report.ledger.error_count(),
                    report.total
                );
            }
            Ok(())
        }
    }
}

fn print_submitted(submitted: &Submitted) {
    match submitted.stored.id {
        Some(id) => println!("Saved with id {id}"),
        None => println!("Saved"),
    }
    match &submitted.listing {
        Ok(records) => println!("{} record(s) now listed", records.len()),
        Err(e) => eprintln!("Warning: could not reload the list: {e}"),
    }
}

fn print_report(report: &BatchReport) {
    if !report.ledger.failures.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["#", "Error"]);
        for (index, error) in &report.ledger.failures {
            table.add_row(vec![(index + 1).to_string(), error.to_string()]);
        }
        println!("{table}");
    }

    println!(
        "{}/{} saved in {}ms (finished {})",
        report.ledger.success_count(),
        report.total,
        report.duration_ms,
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Err(e) = &report.reloaded {
        eprintln!("Warning: could not reload chapter {}: {e}", report.chapter_id);
    }
}
