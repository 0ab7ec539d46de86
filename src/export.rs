use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::App;
use crate::normalize::FlightRow;

/// Dumps the currently displayed tables to a timestamped CSV under
/// `exports/`, arrivals first.
pub fn export_csv(app: &App) -> Result<String> {
    let filename = format!(
        "flightboard-{}-{}.csv",
        app.airport_code.to_lowercase(),
        Local::now().format("%Y%m%d-%H%M%S")
    );
    let mut path = export_path(&filename)?;
    if path.exists() {
        path = unique_path(&path);
    }

    let mut lines = Vec::new();
    lines.push("tipo,horario,voo,origem_destino,companhia,aeronave,status".to_string());
    for row in &app.arrivals {
        lines.push(csv_line("Chegada", row));
    }
    for row in &app.departures {
        lines.push(csv_line("Partida", row));
    }

    fs::write(&path, lines.join("\n"))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path.to_string_lossy().to_string())
}

fn csv_line(kind: &str, row: &FlightRow) -> String {
    format!(
        "{},{},{},{},{},{},{}",
        kind,
        csv_field(&row.time_label),
        csv_field(&row.flight_code),
        csv_field(&row.route_label),
        csv_field(&row.carrier),
        csv_field(&row.aircraft),
        csv_field(&row.status_label)
    )
}

fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn export_path(filename: &str) -> Result<PathBuf> {
    let dir = PathBuf::from("exports");
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir.join(filename))
}

fn unique_path(path: &PathBuf) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let mut i = 1;
    loop {
        let name = if ext.is_empty() {
            format!("{stem}-{i}")
        } else {
            format!("{stem}-{i}.{ext}")
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{csv_field, csv_line};
    use crate::normalize::FlightRow;

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("GOL"), "GOL");
        assert_eq!(csv_field("Rio, Santos Dumont"), "\"Rio, Santos Dumont\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_line_layout() {
        let row = FlightRow {
            time_label: "14:05h".to_string(),
            flight_code: "TAM3100".to_string(),
            route_label: "Rio, Santos Dumont".to_string(),
            carrier: "LATAM".to_string(),
            aircraft: "Airbus A320".to_string(),
            status_label: "Estimado às 14:05".to_string(),
            ..FlightRow::default()
        };
        assert_eq!(
            csv_line("Chegada", &row),
            "Chegada,14:05h,TAM3100,\"Rio, Santos Dumont\",LATAM,Airbus A320,Estimado às 14:05"
        );
    }
}
