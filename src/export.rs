use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::reconcile::Reconciliation;
use crate::role_analysis::RoleAnalysis;
use crate::table_io::{ROLE_REPORT_COLUMNS, format_number, role_report_cells, roster_cell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub enriched_rows: usize,
    pub unmatched_rows: usize,
}

pub fn export_reconciliation(
    path: &Path,
    label: &str,
    headers: &[String],
    result: &Reconciliation,
) -> Result<ExportReport> {
    let mut enriched_rows = vec![header_row(headers, &["Linked_Name", "Link_Score", "Valuation"])];
    for row in &result.enriched {
        let mut cells: Vec<String> = headers
            .iter()
            .map(|h| roster_cell(&row.player, h))
            .collect();
        cells.push(row.linked_name.clone().unwrap_or_default());
        cells.push(opt_to_string(row.link_score));
        cells.push(row.valuation.map(format_number).unwrap_or_default());
        enriched_rows.push(cells);
    }

    let mut unmatched_rows = vec![vec!["Player".to_string()]];
    unmatched_rows.extend(result.unmatched.iter().map(|name| vec![name.clone()]));

    let summary = summary_rows(
        label,
        &[
            ("Roster rows", result.enriched.len()),
            ("Matched", result.matched_count()),
            ("Unmatched", result.unmatched.len()),
        ],
    );

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Enriched")?;
        write_rows(sheet, &enriched_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Unmatched")?;
        write_rows(sheet, &unmatched_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        enriched_rows: enriched_rows.len() - 1,
        unmatched_rows: unmatched_rows.len() - 1,
    })
}

pub fn export_role_analysis(path: &Path, analysis: &RoleAnalysis) -> Result<ExportReport> {
    let mut rows = vec![ROLE_REPORT_COLUMNS.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
    rows.extend(analysis.ranked_rows().into_iter().map(role_report_cells));

    let mut unmatched_rows = vec![vec!["Role".to_string(), "Player".to_string()]];
    unmatched_rows.extend(
        analysis
            .unmatched()
            .into_iter()
            .map(|(role, name)| vec![role.label().to_string(), name.to_string()]),
    );

    let counts: Vec<(String, usize)> = analysis
        .reports
        .iter()
        .map(|r| (format!("{} linked", r.role.label()), r.rows.len()))
        .collect();
    let count_refs: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let mut summary = summary_rows("roles", &count_refs);
    for report in &analysis.reports {
        if let Some(fit) = report.fit {
            summary.push(vec![
                format!("{} fit", report.role.label()),
                format!("train {} test {}", fit.train_rows, fit.test_rows),
                format!("RMSE {:.2}", fit.rmse),
                format!("R2 {:.3}", fit.r2),
            ]);
        }
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Roles")?;
        write_rows(sheet, &rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Unmatched")?;
        write_rows(sheet, &unmatched_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        enriched_rows: rows.len() - 1,
        unmatched_rows: unmatched_rows.len() - 1,
    })
}

fn header_row(headers: &[String], extra: &[&str]) -> Vec<String> {
    headers
        .iter()
        .cloned()
        .chain(extra.iter().map(|h| h.to_string()))
        .collect()
}

fn summary_rows(label: &str, counts: &[(&str, usize)]) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec!["Stage".to_string(), label.to_string()],
        vec![
            "Generated".to_string(),
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    ];
    rows.extend(
        counts
            .iter()
            .map(|(name, count)| vec![name.to_string(), count.to_string()]),
    );
    rows
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
