//! The `examforge init` command.

use std::path::Path;

use anyhow::Result;

use examforge_store::SAMPLE_CONFIG;

pub fn execute() -> Result<()> {
    write_once(Path::new("examforge.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("samples")?;
    write_once(Path::new("samples/qcm.json"), SAMPLE_QCM)?;

    println!("\nNext steps:");
    println!("  1. Edit examforge.toml and export EXAMFORGE_TOKEN");
    println!("  2. Run: examforge validate --surface qcm --file samples/qcm.json");
    println!("  3. Run: examforge import --surface qcm --file samples/qcm.json --target 1 --dry-run");

    Ok(())
}

fn write_once(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_QCM: &str = r#"[
  {
    "question": "Quelle est la capitale du Maroc ?",
    "questionArabic": "ما هي عاصمة المغرب؟",
    "options": [
      { "id": "a", "text": "Casablanca", "textArabic": "الدار البيضاء" },
      { "id": "b", "text": "Rabat", "textArabic": "الرباط" },
      { "id": "c", "text": "Fès", "textArabic": "فاس" },
      { "id": "d", "text": "Marrakech", "textArabic": "مراكش" }
    ],
    "correctAnswer": "b",
    "explanation": "Rabat est la capitale administrative.",
    "explanationArabic": "الرباط هي العاصمة الإدارية."
  },
  {
    "question": "Combien font 7 x 8 ?",
    "questionArabic": "كم يساوي 7 × 8؟",
    "options": [
      { "id": "a", "text": "54" },
      { "id": "b", "text": "56" },
      { "id": "c", "text": "58" },
      { "id": "d", "text": "64" }
    ],
    "correctAnswer": "b"
  }
]
"#;
