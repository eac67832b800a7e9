//! Terminal rendering of the rows that were just appended to the CSV report.

use crate::report::ReportOutput;
use comfy_table::{
    presets,
    Attribute,
    Cell,
    ContentArrangement,
    Table,
};

/// Render the pass result as a terminal table, or `None` when nothing was
/// written.
pub fn render(output: &ReportOutput) -> Option<String> {
    let (title, header, rows) = match output {
        ReportOutput::NoneActive => return None,
        ReportOutput::Single { header, rows } => ("SINGLE DEPLOYMENT RESULTS", header, rows.clone()),
        ReportOutput::Combined { header, row } => ("COMBINED DEPLOYMENT RESULTS", header, vec![row.clone()]),
    };

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    for row in rows {
        table.add_row(row);
    }

    Some(format!("\n{:^80}\n{table}\n", title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_active_renders_nothing() {
        assert_eq!(render(&ReportOutput::NoneActive), None);
    }

    #[test]
    fn single_output_renders_all_cells() {
        let output = ReportOutput::Single {
            header: vec!["Deployment Name".to_string(), "FPS".to_string()],
            rows: vec![vec!["frs".to_string(), "30 (2)".to_string()]],
        };
        let rendered = render(&output).unwrap();
        assert!(rendered.contains("SINGLE DEPLOYMENT RESULTS"));
        assert!(rendered.contains("frs"));
        assert!(rendered.contains("30 (2)"));
    }
}
