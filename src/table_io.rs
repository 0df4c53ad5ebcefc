use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use crate::attribution::AttributedListing;
use crate::reconcile::EnrichedPlayer;
use crate::role_analysis::{RoleAnalysis, RoleRow};
use crate::roster::{CanonicalPlayer, ExternalRecord, dedupe_roster, format_display_name};

pub const COL_PLAYER: &str = "Player";
pub const COL_TEAM: &str = "Team";
pub const COL_POSITION: &str = "Position";
pub const COL_MINUTES: &str = "Minutes";
pub const COL_PRICE: &str = "Price";

const LINK_COLUMNS: [&str; 3] = ["Linked_Name", "Link_Score", "Valuation"];

pub const ROLE_REPORT_COLUMNS: [&str; 8] = [
    COL_PLAYER,
    COL_TEAM,
    "Nation",
    COL_POSITION,
    "Linked_Name",
    "Link_Score",
    "Actual_Transfer_Value_M",
    "Predicted_Transfer_Value_M",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterTable {
    pub headers: Vec<String>,
    pub players: Vec<CanonicalPlayer>,
}

impl RosterTable {
    pub fn from_players(players: Vec<CanonicalPlayer>) -> Self {
        let mut headers: Vec<String> = [COL_PLAYER, COL_TEAM, COL_POSITION, COL_MINUTES]
            .iter()
            .map(|h| h.to_string())
            .collect();
        for player in &players {
            for key in player.stats.keys().chain(player.tags.keys()) {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
        Self { headers, players }
    }
}

pub fn read_roster(path: &Path) -> Result<RosterTable> {
    let file = File::open(path).with_context(|| format!("open roster {}", path.display()))?;
    let table = read_roster_from(file).with_context(|| format!("read roster {}", path.display()))?;
    info!(path = %path.display(), players = table.players.len(), "roster loaded");
    Ok(table)
}

/// Player names are put into display form and de-duplicated (first wins).
/// Cells that do not parse as numbers become text tags.
pub fn read_roster_from<R: Read>(reader: R) -> Result<RosterTable> {
    let mut rdr = csv_reader(reader);
    let headers = read_headers(&mut rdr)?;
    let player_idx = column(&headers, COL_PLAYER)?;
    let team_idx = headers.iter().position(|h| h == COL_TEAM);
    let position_idx = headers.iter().position(|h| h == COL_POSITION);
    let minutes_idx = headers.iter().position(|h| h == COL_MINUTES);

    let mut players = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("roster row {}", row + 1))?;
        let Some(name) = record.get(player_idx).and_then(format_display_name) else {
            debug!(row = row + 1, "skipping roster row without player name");
            continue;
        };
        let mut player = CanonicalPlayer {
            name,
            team: cell(&record, team_idx),
            position: cell(&record, position_idx),
            minutes: minutes_idx
                .and_then(|idx| record.get(idx))
                .and_then(parse_number)
                .unwrap_or(0.0),
            ..CanonicalPlayer::default()
        };
        for (idx, header) in headers.iter().enumerate() {
            if Some(idx) == team_idx
                || Some(idx) == position_idx
                || Some(idx) == minutes_idx
                || idx == player_idx
            {
                continue;
            }
            let Some(raw) = record.get(idx) else { continue };
            if let Some(value) = parse_number(raw) {
                player.stats.insert(header.clone(), value);
            } else if !is_missing(raw) {
                player.tags.insert(header.clone(), raw.trim().to_string());
            }
        }
        players.push(player);
    }

    Ok(RosterTable {
        headers,
        players: dedupe_roster(players),
    })
}

pub fn read_listing(path: &Path) -> Result<Vec<ExternalRecord>> {
    let file = File::open(path).with_context(|| format!("open listing {}", path.display()))?;
    let listing =
        read_listing_from(file).with_context(|| format!("read listing {}", path.display()))?;
    info!(path = %path.display(), records = listing.len(), "listing loaded");
    Ok(listing)
}

pub fn read_listing_from<R: Read>(reader: R) -> Result<Vec<ExternalRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = read_headers(&mut rdr)?;
    let player_idx = column(&headers, COL_PLAYER)?;
    let price_idx = headers.iter().position(|h| h == COL_PRICE);
    let position_idx = headers.iter().position(|h| h == COL_POSITION);

    let mut out = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("listing row {}", row + 1))?;
        let price = cell(&record, price_idx);
        out.push(ExternalRecord {
            name: cell(&record, Some(player_idx)),
            price: if price.is_empty() { "N/A".to_string() } else { price },
            position: position_idx
                .and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|v| !is_missing(v))
                .map(str::to_string),
        });
    }
    Ok(out)
}

pub fn write_enriched<W: Write>(writer: W, headers: &[String], rows: &[EnrichedPlayer]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header_row: Vec<&str> = headers.iter().map(String::as_str).collect();
    header_row.extend(LINK_COLUMNS);
    wtr.write_record(&header_row).context("write enriched header")?;

    for row in rows {
        let mut cells: Vec<String> = headers.iter().map(|h| roster_cell(&row.player, h)).collect();
        cells.push(row.linked_name.clone().unwrap_or_default());
        cells.push(row.link_score.map(|s| s.to_string()).unwrap_or_default());
        cells.push(row.valuation.map(format_number).unwrap_or_default());
        wtr.write_record(&cells)
            .with_context(|| format!("write enriched row for {}", row.player.name))?;
    }
    wtr.flush().context("flush enriched csv")?;
    Ok(())
}

pub fn write_enriched_csv(path: &Path, headers: &[String], rows: &[EnrichedPlayer]) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_enriched(file, headers, rows)
}

pub fn write_unmatched(path: &Path, names: &[String]) -> Result<()> {
    ensure_parent(path)?;
    let mut body = names.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    fs::write(path, body).with_context(|| format!("write unmatched report {}", path.display()))
}

pub fn write_role_report<W: Write>(writer: W, analysis: &RoleAnalysis) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ROLE_REPORT_COLUMNS)
        .context("write role report header")?;
    for row in analysis.ranked_rows() {
        wtr.write_record(role_report_cells(row))
        .with_context(|| format!("write role row for {}", row.player))?;
    }
    wtr.flush().context("flush role report")?;
    Ok(())
}

pub fn role_report_cells(row: &RoleRow) -> Vec<String> {
    vec![
        row.player.clone(),
        row.team.clone(),
        row.nation.clone(),
        row.role.label().to_string(),
        row.linked_name.clone(),
        row.link_score.to_string(),
        row.actual_value_m.map(format_number).unwrap_or_default(),
        row.predicted_value_m.map(format_number).unwrap_or_default(),
    ]
}

pub fn write_attribution<W: Write>(writer: W, rows: &[&AttributedListing]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([COL_PLAYER, COL_POSITION, COL_PRICE])
        .context("write attribution header")?;
    for row in rows {
        wtr.write_record([&row.player, &row.position, &row.price])
            .with_context(|| format!("write attribution row for {}", row.player))?;
    }
    wtr.flush().context("flush attribution csv")?;
    Ok(())
}

pub fn create_output(path: &Path) -> Result<File> {
    ensure_parent(path)?;
    File::create(path).with_context(|| format!("create {}", path.display()))
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub fn roster_cell(player: &CanonicalPlayer, header: &str) -> String {
    match header {
        COL_PLAYER => player.name.clone(),
        COL_TEAM => player.team.clone(),
        COL_POSITION => player.position.clone(),
        COL_MINUTES => format_number(player.minutes),
        other => player
            .stats
            .get(other)
            .map(|v| format_number(*v))
            .or_else(|| player.tags.get(other).cloned())
            .unwrap_or_default(),
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
}

fn read_headers<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<String>> {
    Ok(rdr
        .headers()
        .context("read csv header")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect())
}

fn column(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| anyhow!("missing '{name}' column"))
}

fn cell(record: &csv::StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "N/A"
}

fn parse_number(raw: &str) -> Option<f64> {
    if is_missing(raw) {
        return None;
    }
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    Ok(())
}
