//! The `examforge preview` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use examforge_core::bulk::parse_batch;
use examforge_core::import::parse_candidates;
use examforge_core::model::Surface;
use examforge_core::{registry, submit};

pub fn execute(surface: Surface, file: PathBuf) -> Result<()> {
    let text = super::read_input(&file)?;

    let mut payloads = match surface {
        Surface::Qcm => parse_batch(&text)?
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()?,
        Surface::Questions | Surface::Essays => {
            let mut payloads = Vec::new();
            for (index, candidate) in parse_candidates(&text)?.iter().enumerate() {
                let record = registry::normalize_question(surface, candidate)
                    .and_then(|record| submit::finalize(&record))
                    .map_err(|e| e.at_position(index + 1))?;
                payloads.push(serde_json::to_value(&record)?);
            }
            payloads
        }
    };

    let output = if payloads.len() == 1 {
        payloads.remove(0)
    } else {
        Value::Array(payloads)
    };
    let rendered = serde_json::to_string_pretty(&output).context("failed to render preview")?;
    println!("{rendered}");
    Ok(())
}
