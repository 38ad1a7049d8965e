//! Rendering of [`MonitorState`] with ratatui.
//!
//! Nothing here talks to the controller or the database; every frame is
//! drawn from a snapshot of the poller's state.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as Segment},
        Block, Borders, List, ListItem, Paragraph, Row, Table,
    },
    Frame,
};
use rws_monitor::chart::{project, project_shared, PlotSize, Point, Scale};
use rws_monitor::normalize::{format_value, BLANK, FETCHING, UNAVAILABLE};
use rws_monitor::{Measurement, MonitorState};

const X_COLOR: Color = Color::Red;
const Y_COLOR: Color = Color::Green;
const Z_COLOR: Color = Color::Blue;

pub fn draw(f: &mut Frame, state: &MonitorState, polling: bool) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),  // Readout & status
            Constraint::Min(10),    // Charts
            Constraint::Length(12), // Histories
            Constraint::Length(8),  // Latest rows
            Constraint::Length(3),  // Help
        ])
        .split(f.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(main_chunks[0]);
    render_readout(f, top[0], state);
    render_status(f, top[1], state, polling);

    let thirds = [
        Constraint::Percentage(30),
        Constraint::Percentage(30),
        Constraint::Percentage(40),
    ];
    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(thirds)
        .split(main_chunks[1]);
    render_charts(f, &charts, state);

    let histories = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(thirds)
        .split(main_chunks[2]);
    render_histories(f, &histories, state);

    render_latest(f, main_chunks[3], state);
    render_help(f, main_chunks[4], polling);
}

fn value_style(text: &str) -> Style {
    if text == UNAVAILABLE {
        Style::default().fg(Color::Red)
    } else if text == FETCHING {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    }
}

fn field<'a>(label: &'a str, value: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Cyan)),
        Span::styled(value, value_style(value)),
    ])
}

fn render_readout(f: &mut Frame, area: Rect, state: &MonitorState) {
    let readout = &state.readout;
    let lines = vec![
        field("Moottorit: ", &readout.motors),
        field("Ohjelma:   ", &readout.program),
        field("Tarttuja:  ", &readout.gripper),
        field("TCP-nopeus: ", &readout.speed),
        field("", &readout.pos_x),
        field("", &readout.pos_y),
        field("", &readout.pos_z),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Robotti")
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(paragraph, area);
}

fn render_status(f: &mut Frame, area: Rect, state: &MonitorState, polling: bool) {
    let mut lines = vec![Line::from(
        state
            .last_update_text()
            .unwrap_or_else(|| FETCHING.to_string()),
    )];
    lines.push(Line::from(vec![
        Span::styled("Jaksoja: ", Style::default().fg(Color::Cyan)),
        Span::raw(state.cycles.to_string()),
    ]));
    if polling {
        lines.push(Line::from(Span::styled(
            "Päivitys käynnissä…",
            Style::default().fg(Color::Yellow),
        )));
    }
    if let Some(status) = &state.status {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("⚠ ", Style::default().fg(Color::Red)),
            Span::styled(status.as_str(), Style::default().fg(Color::Red)),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Tila")
            .border_style(Style::default().fg(if state.status.is_some() {
                Color::Red
            } else {
                Color::Green
            })),
    );
    f.render_widget(paragraph, area);
}

fn render_charts(f: &mut Frame, areas: &[Rect], state: &MonitorState) {
    let size = PlotSize::default();

    let gripper: Vec<f64> = state
        .gripper_history
        .iter_chronological()
        .map(|e| e.value)
        .collect();
    let speed: Vec<f64> = state
        .speed_history
        .iter_chronological()
        .map(|e| e.value)
        .collect();
    let (xs, (ys, zs)): (Vec<f64>, (Vec<f64>, Vec<f64>)) = state
        .position_history
        .iter_chronological()
        .map(|e| (e.x, (e.y, e.z)))
        .unzip();
    let [x, y, z] = project_shared([xs.as_slice(), ys.as_slice(), zs.as_slice()], size);

    render_chart(
        f,
        areas[0],
        "Tarttuja",
        vec![(project(&gripper, Scale::UNIT, size), Color::Magenta)],
        size,
    );
    render_chart(
        f,
        areas[1],
        "TCP-nopeus",
        vec![(project(&speed, Scale::Auto, size), Color::Yellow)],
        size,
    );
    render_chart(
        f,
        areas[2],
        "Sijainti X/Y/Z",
        vec![(x, X_COLOR), (y, Y_COLOR), (z, Z_COLOR)],
        size,
    );
}

fn render_chart(f: &mut Frame, area: Rect, title: &str, series: Vec<(Vec<Point>, Color)>, size: PlotSize) {
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_bounds([0.0, size.width])
        .y_bounds([0.0, size.height])
        .paint(move |ctx| {
            for (points, color) in &series {
                // Canvas y grows upwards.
                for pair in points.windows(2) {
                    ctx.draw(&Segment {
                        x1: pair[0].x,
                        y1: size.height - pair[0].y,
                        x2: pair[1].x,
                        y2: size.height - pair[1].y,
                        color: *color,
                    });
                }
            }
        });
    f.render_widget(canvas, area);
}

fn history_item(time: String, spans: Vec<Span<'_>>) -> ListItem<'_> {
    let mut line = vec![Span::styled(
        format!("[{}] ", time),
        Style::default().fg(Color::DarkGray),
    )];
    line.extend(spans);
    ListItem::new(Line::from(line))
}

fn render_histories(f: &mut Frame, areas: &[Rect], state: &MonitorState) {
    let gripper: Vec<ListItem> = state
        .gripper_history
        .iter()
        .map(|e| history_item(e.time_label(), vec![Span::raw(e.text.as_str())]))
        .collect();
    let speed: Vec<ListItem> = state
        .speed_history
        .iter()
        .map(|e| history_item(e.time_label(), vec![Span::raw(e.text.as_str())]))
        .collect();
    let position: Vec<ListItem> = state
        .position_history
        .iter()
        .map(|e| {
            history_item(
                e.time_label(),
                vec![
                    Span::styled(format!("X {} ", e.x_text), Style::default().fg(X_COLOR)),
                    Span::styled(format!("Y {} ", e.y_text), Style::default().fg(Y_COLOR)),
                    Span::styled(format!("Z {}", e.z_text), Style::default().fg(Z_COLOR)),
                ],
            )
        })
        .collect();

    for ((items, title), area) in [
        (gripper, "Tarttujahistoria"),
        (speed, "Nopeushistoria"),
        (position, "Sijaintihistoria"),
    ]
    .into_iter()
    .zip(areas.iter())
    {
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(list, *area);
    }
}

/// Display cells for one persisted row: time, gripper, speed, X, Y, Z.
pub fn measurement_cells(m: &Measurement) -> [String; 6] {
    let number = |v: Option<f64>| v.map(format_value).unwrap_or_else(|| BLANK.to_string());
    let gripper = match m.gripper {
        Some(true) => "Kiinni".to_string(),
        Some(false) => "Auki".to_string(),
        None => BLANK.to_string(),
    };
    [
        m.measured_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        gripper,
        number(m.tcp_speed),
        number(m.pos_x),
        number(m.pos_y),
        number(m.pos_z),
    ]
}

fn render_latest(f: &mut Frame, area: Rect, state: &MonitorState) {
    let header = Row::new(["Aika", "Tarttuja", "Nopeus", "X", "Y", "Z"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = state
        .latest_measurements
        .iter()
        .map(|m| Row::new(measurement_cells(m)))
        .collect();
    let widths = [
        Constraint::Length(20),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Viimeisimmät mittaukset"),
    );
    f.render_widget(table, area);
}

fn render_help(f: &mut Frame, area: Rect, polling: bool) {
    let refresh = if polling {
        Span::styled("r=Päivitä nyt", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw("r=Päivitä nyt")
    };
    let help = Paragraph::new(Line::from(vec![refresh, Span::raw("  q=Lopeta")]))
        .block(Block::default().borders(Borders::ALL).title("Näppäimet"));
    f.render_widget(help, area);
}
