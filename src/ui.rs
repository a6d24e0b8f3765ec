use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

use vahan_dashboard::{
    build_dashboard, format_count, load_data, CacheKey, DashboardFilters, DashboardView,
    DataPaths, LoadCache, SourceMode, VehicleGroup,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Kpis,
    Trends,
    Makers,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Kpis => Page::Trends,
            Page::Trends => Page::Makers,
            Page::Makers => Page::Kpis,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Kpis => Page::Makers,
            Page::Trends => Page::Kpis,
            Page::Makers => Page::Trends,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Kpis => "Market KPIs",
            Page::Trends => "Monthly Trends",
            Page::Makers => "Manufacturers",
        }
    }
}

pub struct App {
    paths: DataPaths,
    cache: LoadCache,
    pub filters: DashboardFilters,
    pub view: DashboardView,
    pub current_page: Page,
    pub trend_state: TableState,
    pub maker_state: TableState,
}

impl App {
    pub fn new(paths: DataPaths, cache: LoadCache, filters: DashboardFilters) -> Result<Self> {
        let mut app = App {
            paths,
            cache,
            filters,
            view: DashboardView::Empty,
            current_page: Page::Kpis,
            trend_state: TableState::default(),
            maker_state: TableState::default(),
        };
        app.refresh()?;
        Ok(app)
    }

    /// Full recomputation pass: load (through the cache), filter, aggregate.
    /// Every interaction that changes filter state re-runs this.
    pub fn refresh(&mut self) -> Result<()> {
        let ev_only = self.filters.ev_only;
        let yearly = self.cache.get_or_load(
            CacheKey {
                mode: SourceMode::Yearly,
                ev_only,
            },
            || load_data(&self.paths, SourceMode::Yearly, ev_only),
        )?;
        let monthly = self.cache.get_or_load(
            CacheKey {
                mode: SourceMode::Monthly,
                ev_only,
            },
            || load_data(&self.paths, SourceMode::Monthly, ev_only),
        )?;

        self.view = build_dashboard(&yearly, &monthly, &self.filters);

        self.trend_state = TableState::default();
        self.maker_state = TableState::default();
        if let DashboardView::Ready(data) = &self.view {
            if !data.monthly_trend.is_empty() {
                self.trend_state.select(Some(0));
            }
            if !data.maker_growth.is_empty() {
                self.maker_state.select(Some(0));
            }
        }
        Ok(())
    }

    pub fn toggle_ev(&mut self) -> Result<()> {
        self.filters.ev_only = !self.filters.ev_only;
        self.refresh()
    }

    /// Cycle the group filter: all -> 2W -> 3W -> 4W -> Other -> all.
    pub fn cycle_group_filter(&mut self) -> Result<()> {
        let all = VehicleGroup::all();
        let next = match self.filters.groups.first() {
            None => Some(all[0]),
            Some(current) => all
                .iter()
                .position(|g| g == current)
                .and_then(|i| all.get(i + 1))
                .copied(),
        };
        self.filters.groups = next.into_iter().collect();
        self.refresh()
    }

    pub fn clear_filters(&mut self) -> Result<()> {
        self.filters = DashboardFilters::default();
        self.refresh()
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn page_rows(&self) -> usize {
        match &self.view {
            DashboardView::Empty => 0,
            DashboardView::Ready(data) => match self.current_page {
                Page::Kpis => data.kpis.len(),
                Page::Trends => data.monthly_trend.len(),
                Page::Makers => data.maker_growth.len(),
            },
        }
    }

    fn page_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Makers => &mut self.maker_state,
            _ => &mut self.trend_state,
        }
    }

    pub fn next_row(&mut self) {
        let len = self.page_rows();
        if len == 0 {
            return;
        }
        let state = self.page_state();
        let i = match state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let len = self.page_rows();
        if len == 0 {
            return;
        }
        let state = self.page_state();
        let i = match state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('e') => app.toggle_ev()?,
                KeyCode::Char('g') => app.cycle_group_filter()?,
                KeyCode::Char('c') => app.clear_filters()?,
                KeyCode::Down | KeyCode::Char('j') => app.next_row(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_row(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match &app.view {
        DashboardView::Empty => render_empty_state(f, chunks[1]),
        DashboardView::Ready(_) => match app.current_page {
            Page::Kpis => render_kpis(f, chunks[1], app),
            Page::Trends => render_trends(f, chunks[1], app),
            Page::Makers => render_makers(f, chunks[1], app),
        },
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Kpis, Page::Trends, Page::Makers];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    if let DashboardView::Ready(data) = &app.view {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("Years: {}–{}", data.year_bounds.0, data.year_bounds.1),
            Style::default().fg(Color::White),
        ));
    }

    if app.filters.ev_only {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled("EV only", Style::default().fg(Color::Green)));
    }
    if let Some(group) = app.filters.groups.first() {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("Group: {group}"),
            Style::default().fg(Color::Cyan),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" 🚗 Vahan Registrations "),
    );

    f.render_widget(header, area);
}

fn render_empty_state(f: &mut Frame, area: Rect) {
    let message = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No data matches the current filters.",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Try expanding the year range, clearing the group filter ('c'),"),
        Line::from("or disabling the EV-only toggle ('e')."),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Dashboard "));

    f.render_widget(message, area);
}

fn delta_color(delta: &str) -> Color {
    if delta.starts_with('+') {
        Color::Green
    } else if delta.starts_with('-') {
        Color::Red
    } else {
        Color::DarkGray
    }
}

fn render_kpis(f: &mut Frame, area: Rect, app: &App) {
    let DashboardView::Ready(data) = &app.view else {
        return;
    };

    let header_cells = ["Group", "QoQ latest", "QoQ", "YoY latest", "YoY"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = data.kpis.iter().map(|kpi| {
        Row::new(vec![
            Cell::from(kpi.group.as_str()),
            Cell::from(format_count(kpi.qoq_latest)),
            Cell::from(kpi.qoq_delta.clone())
                .style(Style::default().fg(delta_color(&kpi.qoq_delta))),
            Cell::from(format_count(kpi.yoy_latest)),
            Cell::from(kpi.yoy_delta.clone())
                .style(Style::default().fg(delta_color(&kpi.yoy_delta))),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" QoQ (monthly data) & YoY (yearly data) by category "),
    );

    f.render_widget(table, area);
}

fn render_trends(f: &mut Frame, area: Rect, app: &mut App) {
    let DashboardView::Ready(data) = &app.view else {
        return;
    };

    let header_cells = ["Month", "Group", "Registrations"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = data.monthly_trend.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.period.format("%Y-%m").to_string()),
            Cell::from(row.group.as_str()),
            Cell::from(format_count(row.registrations as i64)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Monthly registrations by vehicle category "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.trend_state);
}

fn render_makers(f: &mut Frame, area: Rect, app: &mut App) {
    let DashboardView::Ready(data) = &app.view else {
        return;
    };

    if !data.has_maker {
        let message = Paragraph::new(vec![
            Line::from(""),
            Line::from("Manufacturer column not found in the yearly dataset;"),
            Line::from("maker-level analysis is hidden."),
            Line::from(""),
            Line::from("Category trends and KPIs are still available."),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Manufacturers "));
        f.render_widget(message, area);
        return;
    }

    let header_cells = ["Maker", "YoY change %", "Latest period"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = data.maker_growth.iter().map(|row| {
        let change = match row.yoy_change_pct {
            Some(pct) => format!("{pct:+.1}%"),
            None => "n/a".to_string(),
        };
        let latest = row
            .latest
            .map(format_count)
            .unwrap_or_else(|| "-".to_string());

        Row::new(vec![
            Cell::from(row.maker.clone()),
            Cell::from(change.clone()).style(Style::default().fg(delta_color(&change))),
            Cell::from(latest),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(14),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" YoY growth by manufacturer (yearly data) "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.maker_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.current_page.title()),
        Style::default().fg(Color::Cyan),
    )];

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("e", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" EV toggle | "));
    status_spans.push(Span::styled("g", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Group | "));
    status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Clear | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
