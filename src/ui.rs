use chrono::Utc;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::highlight;
use crate::highlight::HistoryEntry;
use crate::normalize::{display_offset, FlightRow};

const ARRIVAL_FLASH: Color = Color::Rgb(184, 76, 76);
const ARRIVAL_CALM: Color = Color::Rgb(58, 15, 15);
const DEPARTURE_FLASH: Color = Color::Rgb(61, 184, 109);
const DEPARTURE_CALM: Color = Color::Rgb(15, 58, 26);
const PANEL_BG: Color = Color::Rgb(19, 25, 39);
const GOLD: Color = Color::Rgb(255, 215, 0);
const TIME_ACCENT: Color = Color::Rgb(208, 88, 211);

pub fn ui(f: &mut Frame, app: &App) {
    if app.simplified {
        render_simplified(f, app);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0], app);
    render_full_body(f, chunks[1], app);
    render_footer(f, chunks[2], app);
}

fn render_full_body(f: &mut Frame, area: Rect, app: &App) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(area);

    let tables = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(body[0]);
    render_schedule_table(
        f,
        tables[0],
        "Próximas Chegadas",
        &app.arrivals,
        "Nenhuma chegada listada.",
    );
    render_schedule_table(
        f,
        tables[1],
        "Próximas Partidas",
        &app.departures,
        "Nenhuma partida listada.",
    );

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Min(8),
        ])
        .split(body[1]);
    render_highlight(f, side[0], app, highlight::Direction::Arrival);
    render_highlight(f, side[1], app, highlight::Direction::Departure);
    render_history(f, side[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let now_brt = Utc::now().with_timezone(&display_offset());
    let mut lines = vec![
        Line::from(Span::styled(
            format!("✈ Painel do Aeroporto — {}", app.airport_code),
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "Hora local: {} BRT · atualização a cada {}s",
            now_brt.format("%Y-%m-%d %H:%M:%S"),
            app.refresh.as_secs()
        )),
    ];

    match app.fetched_at_brt() {
        Some(fetched) => lines.push(Line::from(Span::styled(
            format!(
                "Dados atualizados em: {fetched} BRT | Tela recarregada às {}",
                now_brt.format("%H:%M:%S")
            ),
            Style::default().fg(Color::Green),
        ))),
        None => lines.push(Line::from(Span::styled(
            "Nenhum dado carregado. Aguardando primeira coleta.",
            Style::default().fg(Color::Yellow),
        ))),
    }

    if let Some(err) = &app.last_error {
        lines.push(Line::from(Span::styled(
            format!("ERR: {err}"),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_highlight(f: &mut Frame, area: Rect, app: &App, direction: highlight::Direction) {
    let (selection, flash, title, preposition) = match direction {
        highlight::Direction::Arrival => (
            app.highlight_arr.as_ref(),
            app.flash_arr,
            "🛬 CHEGADA",
            "Vindo de",
        ),
        highlight::Direction::Departure => (
            app.highlight_dep.as_ref(),
            app.flash_dep,
            "🛫 PARTIDA",
            "Para",
        ),
    };
    let bg = highlight_bg(direction, flash);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(Span::styled(
            title,
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(bg));

    let lines = match selection {
        Some(selection) => {
            let row = &selection.row;
            let craft = if row.aircraft.is_empty() {
                row.flight_code.clone()
            } else {
                row.aircraft.clone()
            };
            vec![
                Line::from(vec![
                    Span::styled(
                        row.carrier.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!(" - {}", row.flight_code)),
                ]),
                Line::from(Span::styled(
                    craft,
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
                Line::from(format!("{preposition}: {}", row.route_label)),
                Line::from(format!("Status: {}", row.status_label)),
            ]
        }
        None => vec![Line::from("Sem destaque no momento.")],
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn highlight_bg(direction: highlight::Direction, flash: bool) -> Color {
    match (direction, flash) {
        (highlight::Direction::Arrival, true) => ARRIVAL_FLASH,
        (highlight::Direction::Arrival, false) => ARRIVAL_CALM,
        (highlight::Direction::Departure, true) => DEPARTURE_FLASH,
        (highlight::Direction::Departure, false) => DEPARTURE_CALM,
    }
}

fn render_schedule_table(
    f: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[FlightRow],
    empty_message: &str,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title.to_string(), Style::default().fg(GOLD)));

    if rows.is_empty() {
        let paragraph = Paragraph::new(empty_message.to_string())
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Horário"),
        Cell::from("Voo"),
        Cell::from("Origem/Destino"),
        Cell::from("Companhia"),
        Cell::from("Aeronave"),
        Cell::from("Status"),
    ])
    .style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));

    let body = rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(Span::styled(
                row.time_label.clone(),
                Style::default().fg(TIME_ACCENT),
            )),
            Cell::from(row.flight_code.clone()),
            Cell::from(row.route_label.clone()),
            Cell::from(row.carrier.clone()),
            Cell::from(row.aircraft.clone()),
            Cell::from(row.status_label.clone()),
        ])
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Min(18),
        ],
    )
    .header(header)
    .block(block);
    f.render_widget(table, area);
}

fn render_history(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            "Histórico de Destaques",
            Style::default()
                .fg(GOLD)
                .add_modifier(Modifier::ITALIC),
        ))
        .style(Style::default().bg(PANEL_BG));

    if app.history().is_empty() {
        let paragraph = Paragraph::new("Nenhum destaque anterior.")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Tipo"),
        Cell::from("Horário"),
        Cell::from("Voo"),
        Cell::from("Origem/Destino"),
        Cell::from("Companhia"),
        Cell::from("Status"),
    ])
    .style(Style::default().fg(GOLD));

    let body = app.history().iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.direction.label()),
            Cell::from(entry.time_label.clone()),
            Cell::from(entry.flight_code.clone()),
            Cell::from(entry.route_label.clone()),
            Cell::from(entry.carrier.clone()),
            Cell::from(entry.status_label.clone()),
        ])
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Min(14),
            Constraint::Length(14),
            Constraint::Min(14),
        ],
    )
    .header(header)
    .block(block)
    .style(Style::default().fg(Color::White));
    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let mut text = String::from("q sair · s simplificar · r atualizar · e exportar CSV");
    if let Some(path) = &app.last_export {
        text.push_str(&format!(" · exportado: {path}"));
    }
    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(paragraph, area);
}

/// Compact layout for small screens: just the two highlight strips and
/// the latest retired highlight per direction.
fn render_simplified(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(6),
            Constraint::Min(4),
        ])
        .split(f.area());

    let title = Paragraph::new(Span::styled(
        format!("✈️ Painel do Aeroporto — {}", app.airport_code),
        Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(title, chunks[0]);

    let boxes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_simple_box(f, boxes[0], app, highlight::Direction::Arrival);
    render_simple_box(f, boxes[1], app, highlight::Direction::Departure);

    render_simple_history(f, chunks[2], app);
}

fn render_simple_box(f: &mut Frame, area: Rect, app: &App, direction: highlight::Direction) {
    let (selection, flash, title) = match direction {
        highlight::Direction::Arrival => (app.highlight_arr.as_ref(), app.flash_arr, "🛬 CHEGADA"),
        highlight::Direction::Departure => {
            (app.highlight_dep.as_ref(), app.flash_dep, "🛫 PARTIDA")
        }
    };
    let bg = if flash {
        highlight_bg(direction, true)
    } else {
        PANEL_BG
    };

    let lines = match selection {
        Some(selection) => {
            let row = &selection.row;
            let carrier_short = row.carrier.split_whitespace().next().unwrap_or("");
            let route = match direction {
                highlight::Direction::Arrival => {
                    format!("{} → {}", row.route_code, app.airport_code)
                }
                highlight::Direction::Departure => {
                    format!("{} → {}", app.airport_code, row.route_code)
                }
            };
            vec![
                Line::from(Span::styled(
                    format!("{carrier_short} {} {route}", row.flight_code),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    row.status_label.clone(),
                    Style::default().fg(TIME_ACCENT),
                )),
            ]
        }
        None => vec![Line::from("")],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            title,
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(bg));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_simple_history(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            "Histórico",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        ))
        .style(Style::default().bg(PANEL_BG));

    let lines = vec![
        simple_history_line(app.last_retired(highlight::Direction::Arrival)),
        simple_history_line(app.last_retired(highlight::Direction::Departure)),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(Style::default().fg(Color::White)),
        area,
    );
}

fn simple_history_line(entry: Option<&HistoryEntry>) -> Line<'static> {
    match entry {
        Some(entry) => {
            let hora = if entry.time_label.is_empty() {
                "--:--"
            } else {
                entry.time_label.trim_end_matches('h')
            };
            Line::from(format!(
                "{}  {} {}  {}",
                hora,
                entry.carrier,
                entry.route_label,
                entry.status_label.to_uppercase()
            ))
        }
        None => Line::from("--:--  Sem registro  —"),
    }
}
