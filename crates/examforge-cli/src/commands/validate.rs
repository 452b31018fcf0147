//! The `examforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examforge_core::import::parse_candidates;
use examforge_core::model::Surface;
use examforge_core::registry::{self, ValidationWarning};

pub fn execute(surface: Surface, file: PathBuf) -> Result<()> {
    let text = super::read_input(&file)?;
    let candidates = parse_candidates(&text)?;
    println!(
        "File: {} ({} question(s), surface {surface})",
        file.display(),
        candidates.len()
    );

    let mut errors = 0;
    let mut total_warnings = 0;

    for (index, candidate) in candidates.iter().enumerate() {
        let position = index + 1;
        match check(surface, candidate) {
            Ok((label, warnings)) => {
                println!("  [{position}] OK: {label}");
                for w in &warnings {
                    let field = w.field.as_deref().unwrap_or("record");
                    println!("  [{position}] WARNING ({field}): {}", w.message);
                }
                total_warnings += warnings.len();
            }
            Err(e) => {
                println!("  [{position}] ERROR: {e}");
                errors += 1;
            }
        }
    }

    if errors == 0 && total_warnings == 0 {
        println!("All questions valid.");
    } else {
        println!("\n{errors} error(s), {total_warnings} warning(s) found.");
    }

    if errors > 0 {
        anyhow::bail!("{errors} question(s) failed validation");
    }
    Ok(())
}

fn check(
    surface: Surface,
    candidate: &serde_json::Value,
) -> Result<(String, Vec<ValidationWarning>), examforge_core::error::AuthoringError> {
    match surface {
        Surface::Qcm => {
            let qcm = registry::normalize_qcm(candidate)?;
            Ok((format!("qcm, answer {}", qcm.correct_answer), Vec::new()))
        }
        Surface::Questions | Surface::Essays => {
            let record = registry::normalize_question(surface, candidate)?;
            let warnings = registry::lint_record(&record);
            Ok((record.kind().to_string(), warnings))
        }
    }
}
