//! Shelf TUI - Operator console for the smart shelf
//!
//! Opens the same store as the CLI and displays:
//! - Customer stature (average height, comfortable gaze range)
//! - Zone scores (gaze, ergonomic, combined)
//! - Recommended layout
//! - Stock levels with restock alerts
//!
//! Sales and restocks of the selected item are written through immediately.

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Row, Table},
    Frame, Terminal,
};
use shelf_optimizer::domain::StockLevel;
use shelf_optimizer::infra::Config;
use shelf_optimizer::services::{Report, ShelfEngine};
use std::io;
use std::time::{Duration, Instant};

/// Bounds for the quantity applied by sell/restock keys
const MIN_QTY: u32 = 1;
const MAX_QTY: u32 = 100;

/// Refresh the report even without key presses
const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "shelf-tui", about = "Smart shelf operator console")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

/// Outcome of the last operator action
#[derive(Debug, Clone)]
enum Status {
    Info(String),
    Ok(String),
    Error(String),
}

struct App {
    engine: ShelfEngine,
    report: Report,
    stock: Vec<StockLevel>,
    selected: usize,
    qty: u32,
    status: Status,
    last_refresh: Instant,
}

impl App {
    fn new(engine: ShelfEngine) -> Self {
        let report = engine.generate_report();
        let stock = engine.stock_levels();
        Self {
            engine,
            report,
            stock,
            selected: 0,
            qty: MIN_QTY,
            status: Status::Info("Ready".to_string()),
            last_refresh: Instant::now(),
        }
    }

    fn refresh(&mut self) {
        self.report = self.engine.generate_report();
        self.stock = self.engine.stock_levels();
        if self.selected >= self.stock.len() {
            self.selected = self.stock.len().saturating_sub(1);
        }
        self.last_refresh = Instant::now();
    }

    fn selected_item(&self) -> Option<String> {
        self.stock.get(self.selected).map(|s| s.item_id.clone())
    }

    fn select_next(&mut self) {
        if !self.stock.is_empty() {
            self.selected = (self.selected + 1) % self.stock.len();
        }
    }

    fn select_prev(&mut self) {
        if !self.stock.is_empty() {
            self.selected = (self.selected + self.stock.len() - 1) % self.stock.len();
        }
    }

    fn adjust_qty(&mut self, delta: i64) {
        let next = (i64::from(self.qty) + delta).clamp(i64::from(MIN_QTY), i64::from(MAX_QTY));
        self.qty = next as u32;
    }

    fn sell(&mut self) {
        let Some(item) = self.selected_item() else {
            self.status = Status::Error("No item selected".to_string());
            return;
        };
        let available = self.engine.item(&item).map_or(0, |i| i.current_stock);
        if available < i64::from(self.qty) {
            self.status = Status::Error(format!(
                "Insufficient stock for {item} (current stock: {available})"
            ));
            return;
        }
        self.status = match self.engine.record_sale(&item, self.qty) {
            Ok(()) => Status::Ok(format!("Sold {} x {item}", self.qty)),
            Err(e) => Status::Error(format!("Sale failed: {e}")),
        };
        self.refresh();
    }

    fn restock(&mut self) {
        let Some(item) = self.selected_item() else {
            self.status = Status::Error("No item selected".to_string());
            return;
        };
        self.status = match self.engine.restock(&item, self.qty) {
            Ok(()) => Status::Ok(format!("Restocked {} x {item}", self.qty)),
            Err(e) => Status::Error(format!("Restock failed: {e}")),
        };
        self.refresh();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path);
    let engine = ShelfEngine::open(config)?;
    let mut app = App::new(engine);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_ui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_ui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(250);

    loop {
        terminal.draw(|f| draw_ui(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
                        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
                        KeyCode::Char(']') | KeyCode::Char('+') => app.adjust_qty(1),
                        KeyCode::Char('[') | KeyCode::Char('-') => app.adjust_qty(-1),
                        KeyCode::Char('s') => app.sell(),
                        KeyCode::Char('r') => app.restock(),
                        KeyCode::Char('g') => {
                            app.refresh();
                            app.status = Status::Info("Report refreshed".to_string());
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.last_refresh.elapsed() >= REFRESH_INTERVAL {
            app.refresh();
        }
    }
}

fn draw_ui(f: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Panels
            Constraint::Length(3), // Status
        ])
        .split(f.area());

    draw_header(f, main_chunks[0], app);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                                        // Stature
            Constraint::Length(app.report.zone_scores.len() as u16 + 3), // Scores
            Constraint::Min(0),                                           // Layout
        ])
        .split(panels[0]);

    draw_stature_panel(f, left[0], app);
    draw_scores_panel(f, left[1], app);
    draw_layout_panel(f, left[2], app);
    draw_stock_panel(f, panels[1], app);
    draw_status(f, main_chunks[2], app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let alert = app.engine.config().alert_threshold();
    let alerts = app.stock.iter().filter(|s| s.stock <= alert).count();
    let alert_color = if alerts > 0 { Color::Red } else { Color::Green };

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Shelf TUI ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw("| Qty: "),
        Span::styled(format!("{}", app.qty), Style::default().fg(Color::Yellow)),
        Span::raw(" | Alerts: "),
        Span::styled(format!("{alerts}"), Style::default().fg(alert_color)),
        Span::raw(" | ↑↓ select  s sell  r restock  [ ] qty  g refresh  q quit"),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn draw_stature_panel(f: &mut Frame, area: Rect, app: &App) {
    let report = &app.report;
    let height = match report.average_height {
        Some(h) => format!("{h:.2} m ({} samples)", report.history_samples),
        None => "no valid history".to_string(),
    };

    let text = Paragraph::new(Line::from(vec![
        Span::raw("Avg height: "),
        Span::styled(height, Style::default().fg(Color::Yellow)),
        Span::raw("  Comfort: "),
        Span::styled(
            format!("{:.2}-{:.2} m", report.comfort_range.lower, report.comfort_range.upper),
            Style::default().fg(Color::Green),
        ),
    ]))
    .block(
        Block::default()
            .title(" Customers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );

    f.render_widget(text, area);
}

fn draw_scores_panel(f: &mut Frame, area: Rect, app: &App) {
    let rows: Vec<Row> = app
        .report
        .ranked_scores()
        .into_iter()
        .map(|s| {
            Row::new(vec![
                s.zone.clone(),
                format!("{:.3}", s.gaze),
                format!("{:.3}", s.ergonomic),
                format!("{:.4}", s.score),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(16), // Zone
            Constraint::Length(8),  // Gaze
            Constraint::Length(10), // Ergonomic
            Constraint::Length(8),  // Score
        ],
    )
    .header(
        Row::new(vec!["Zone", "Gaze", "Ergonomic", "Score"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(" Zone Scores ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(table, area);
}

fn draw_layout_panel(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = if app.report.layout.is_empty() {
        vec![ListItem::new(Span::styled("(no items)", Style::default().fg(Color::DarkGray)))]
    } else {
        app.report
            .layout
            .iter()
            .map(|z| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<14}", z.zone), Style::default().fg(Color::Cyan)),
                    Span::raw(z.items.join(", ")),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .title(" Recommended Layout ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );

    f.render_widget(list, area);
}

fn draw_stock_panel(f: &mut Frame, area: Rect, app: &App) {
    let alert = app.engine.config().alert_threshold();

    let rows: Vec<Row> = app
        .stock
        .iter()
        .enumerate()
        .map(|(idx, level)| {
            let marker = if idx == app.selected { "▶" } else { " " };
            let flag = if level.stock <= alert { "RESTOCK" } else { "" };
            let mut style = if level.stock <= alert {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            if idx == app.selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Row::new(vec![
                marker.to_string(),
                level.item_id.clone(),
                format!("{}", level.stock),
                flag.to_string(),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),  // Marker
            Constraint::Min(10),    // Item
            Constraint::Length(7),  // Stock
            Constraint::Length(8),  // Flag
        ],
    )
    .header(
        Row::new(vec!["", "Item", "Stock", ""])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(format!(" Stock (alert <= {alert}) "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    f.render_widget(table, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let (text, color) = match &app.status {
        Status::Info(msg) => (msg.as_str(), Color::White),
        Status::Ok(msg) => (msg.as_str(), Color::Green),
        Status::Error(msg) => (msg.as_str(), Color::Red),
    };

    let status = Paragraph::new(Span::styled(text, Style::default().fg(color)))
        .block(Block::default().title(" Status ").borders(Borders::ALL));

    f.render_widget(status, area);
}
