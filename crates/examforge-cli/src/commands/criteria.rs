//! The `examforge criteria` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use examforge_core::criteria::{essay_criteria, CriteriaCategory};

pub fn execute(json: bool) -> Result<()> {
    let criteria = essay_criteria();

    if json {
        println!("{}", serde_json::to_string_pretty(&criteria)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Criterion", "المعيار", "Points"]);
    add_category(&mut table, &criteria.discourse);
    add_category(&mut table, &criteria.language);
    println!("{table}");
    println!("Total: {} points", criteria.total_points());
    Ok(())
}

fn add_category(table: &mut Table, category: &CriteriaCategory) {
    for item in &category.items {
        table.add_row(vec![
            Cell::new(&category.title),
            Cell::new(&item.text),
            Cell::new(&item.text_arabic),
            Cell::new(item.points),
        ]);
    }
    table.add_row(vec![
        Cell::new(&category.title),
        Cell::new("Subtotal"),
        Cell::new(&category.title_arabic),
        Cell::new(category.total_points),
    ]);
}
