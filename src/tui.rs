use crate::paging::{page_count, paginate};
use crate::{Result, Session, Summary, Table, Value, summarize};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Row, Table as TableWidget, Tabs},
};
use std::io;

const TAB_TITLES: [&str; 4] = ["Overview", "Trends", "Correlation", "Data"];
const EXPORT_PATH: &str = "filtered_listings.csv";
const CELL_WIDTH: usize = 14;
const BAR_WIDTH: usize = 40;

#[derive(Debug, Default)]
struct UiState {
    tab_index: usize,
    cursor: usize,
    page: usize,
    col_scroll: usize,
    v_scroll: u16,
    status: String,
}

struct View {
    summary: Summary,
    page: Table,
    total_pages: usize,
    filtered_rows: usize,
}

impl View {
    fn compute(session: &Session, page: usize) -> Result<Self> {
        let filtered = session.filtered()?;
        let page_size = session.config().page_size()?;
        Ok(View {
            summary: summarize(&filtered, session.config())?,
            page: paginate(&filtered, page_size, page),
            total_pages: page_count(filtered.row_count(), page_size),
            filtered_rows: filtered.row_count(),
        })
    }
}

enum FilterItem<'a> {
    Brand,
    Fuel(&'a Value),
    Transmission(&'a Value),
}

fn filter_items(session: &Session) -> Vec<FilterItem<'_>> {
    std::iter::once(FilterItem::Brand)
        .chain(session.fuel_options().iter().map(FilterItem::Fuel))
        .chain(session.transmission_options().iter().map(FilterItem::Transmission))
        .collect()
}

pub fn render_tui(session: &mut Session) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let outcome = run(&mut terminal, session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    outcome
}

fn run<B: Backend>(terminal: &mut Terminal<B>, session: &mut Session) -> Result<()> {
    let mut state = UiState {
        page: 1,
        ..UiState::default()
    };

    loop {
        match session.refresh() {
            Ok(true) => state.status = "Dataset expired and was reloaded".to_string(),
            Ok(false) => {}
            Err(e) => state.status = format!("Reload failed: {e}"),
        }
        let view = View::compute(session, state.page)?;
        terminal.draw(|f| draw(f, session, &view, &mut state))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let item_count = filter_items(session).len();
        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Tab => state.tab_index = (state.tab_index + 1) % TAB_TITLES.len(),
            KeyCode::BackTab => {
                state.tab_index = (state.tab_index + TAB_TITLES.len() - 1) % TAB_TITLES.len()
            }
            KeyCode::Up => state.cursor = state.cursor.saturating_sub(1),
            KeyCode::Down => state.cursor = (state.cursor + 1).min(item_count.saturating_sub(1)),
            KeyCode::Char(' ') | KeyCode::Enter => {
                activate(session, state.cursor);
                state.page = 1;
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                let brands = session.brand_options().to_vec();
                session
                    .selection
                    .cycle_brand(&brands, key.code == KeyCode::Char('b'));
                state.page = 1;
            }
            KeyCode::Left => state.page = state.page.saturating_sub(1).max(1),
            KeyCode::Right => state.page = (state.page + 1).min(view.total_pages),
            KeyCode::Char('<') => state.col_scroll = state.col_scroll.saturating_sub(1),
            KeyCode::Char('>') => state.col_scroll += 1,
            KeyCode::PageUp => state.v_scroll = state.v_scroll.saturating_sub(5),
            KeyCode::PageDown => state.v_scroll = state.v_scroll.saturating_add(5),
            KeyCode::Char('e') => {
                state.status = match session.export_csv(EXPORT_PATH) {
                    Ok(n) => format!("Exported {n} rows to {EXPORT_PATH}"),
                    Err(e) => format!("Export failed: {e}"),
                }
            }
            KeyCode::Char('r') => {
                state.status = match session.reload() {
                    Ok(_) => "Dataset reloaded".to_string(),
                    Err(e) => format!("Reload failed: {e}"),
                };
                state.page = 1;
            }
            _ => {}
        }
    }
    Ok(())
}

fn activate(session: &mut Session, cursor: usize) {
    let brands = session.brand_options().to_vec();
    let toggled = match filter_items(session).get(cursor) {
        Some(FilterItem::Brand) => None,
        Some(FilterItem::Fuel(v)) => Some((true, (*v).clone())),
        Some(FilterItem::Transmission(v)) => Some((false, (*v).clone())),
        None => return,
    };
    match toggled {
        None => session.selection.cycle_brand(&brands, true),
        Some((true, fuel)) => session.selection.toggle_fuel(&fuel),
        Some((false, transmission)) => session.selection.toggle_transmission(&transmission),
    }
}

fn block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Thick)
        .border_style(Style::default().fg(Color::Cyan))
}

fn draw(f: &mut Frame, session: &Session, view: &View, state: &mut UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(40)])
        .split(chunks[2]);

    let title = Paragraph::new(format!(
        "Used Car Dashboard | {} of {} listings",
        view.filtered_rows,
        session.normalized().row_count()
    ))
    .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(title, chunks[0]);

    let tabs = Tabs::new(TAB_TITLES.iter().map(|t| t.to_string()).collect::<Vec<_>>())
        .select(state.tab_index)
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .divider("|");
    f.render_widget(tabs, chunks[1]);

    draw_filters(f, body[0], session, state);

    let content = body[1];
    match state.tab_index {
        0 => draw_overview(f, content, session, &view.summary),
        1 => {
            let trends = Paragraph::new(trend_lines(&view.summary))
                .block(block("Trends"))
                .scroll((state.v_scroll, 0));
            f.render_widget(trends, content);
        }
        2 => draw_correlation(f, content, &view.summary, state.col_scroll),
        3 => draw_data(f, content, view, state),
        _ => unreachable!(),
    }

    let footer_text = if state.status.is_empty() {
        "'q' quit | Tab tabs | Up/Down + Space filters | b/B brand | Left/Right page | </> columns | 'e' export | 'r' reload".to_string()
    } else {
        state.status.clone()
    };
    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(footer, chunks[3]);
}

fn draw_filters(f: &mut Frame, area: Rect, session: &Session, state: &UiState) {
    let selection = &session.selection;
    let items: Vec<ListItem> = filter_items(session)
        .into_iter()
        .map(|item| match item {
            FilterItem::Brand => ListItem::new(format!(
                "Brand: {}",
                selection.brand.as_deref().unwrap_or("All")
            )),
            FilterItem::Fuel(v) => ListItem::new(format!(
                "[{}] Fuel: {}",
                if selection.fuels.contains(v) { "x" } else { " " },
                v
            )),
            FilterItem::Transmission(v) => ListItem::new(format!(
                "[{}] Trans: {}",
                if selection.transmissions.contains(v) { "x" } else { " " },
                v
            )),
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(state.cursor));
    let list = List::new(items)
        .block(block("Filters"))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_overview(f: &mut Frame, area: Rect, session: &Session, summary: &Summary) {
    let label = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name}: "), Style::default().fg(Color::Magenta)),
            Span::raw(value),
        ])
    };
    let mut lines = vec![
        label("Total listings", summary.total_listings.to_string()),
        label("Average price", fmt_number(summary.average_price)),
        label("Most common brand", fmt_value(summary.most_common_brand.as_ref())),
        label("Popular fuel type", fmt_value(summary.popular_fuel.as_ref())),
        label("Transmission mode", fmt_value(summary.transmission_mode.as_ref())),
    ];
    if session
        .normalized()
        .column_index(&session.config().owner_column)
        .is_some()
    {
        lines.push(label(
            "Most common ownership",
            fmt_value(summary.ownership_mode.as_ref()),
        ));
    }
    f.render_widget(Paragraph::new(lines).block(block("Key Metrics")), area);
}

fn draw_correlation(f: &mut Frame, area: Rect, summary: &Summary, col_scroll: usize) {
    let matrix = &summary.correlation;
    let start = col_scroll.min(matrix.columns().len());
    let visible = (area.width as usize / CELL_WIDTH).saturating_sub(1).max(1);
    let end = (start + visible).min(matrix.columns().len());

    let header = Row::new(
        std::iter::once(String::new())
            .chain(matrix.columns()[start..end].iter().cloned())
            .collect::<Vec<_>>(),
    )
    .style(Style::default().fg(Color::Green));
    let rows: Vec<Row> = matrix
        .columns()
        .iter()
        .zip(matrix.values())
        .map(|(name, row)| {
            Row::new(
                std::iter::once(name.clone())
                    .chain(row[start..end].iter().map(|v| fmt_number(*v)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    let widths = vec![Constraint::Length(CELL_WIDTH as u16); end - start + 1];
    let table = TableWidget::new(rows, widths)
        .header(header)
        .block(block("Correlation Matrix"))
        .column_spacing(1);
    f.render_widget(table, area);
}

fn draw_data(f: &mut Frame, area: Rect, view: &View, state: &UiState) {
    let headers = view.page.headers();
    let start = state.col_scroll.min(headers.len());
    let visible = (area.width as usize / CELL_WIDTH).max(1);
    let end = (start + visible).min(headers.len());

    let header = Row::new(headers[start..end].to_vec()).style(Style::default().fg(Color::Green));
    let rows: Vec<Row> = view
        .page
        .rows()
        .iter()
        .map(|row| Row::new(row[start..end].iter().map(|v| v.to_string()).collect::<Vec<_>>()))
        .collect();
    let widths = vec![Constraint::Length(CELL_WIDTH as u16); end - start];
    let title = format!(
        "Filtered Data | page {}/{} | {} rows",
        state.page.min(view.total_pages),
        view.total_pages,
        view.filtered_rows
    );
    let table = TableWidget::new(rows, widths)
        .header(header)
        .block(block(&title))
        .column_spacing(1);
    f.render_widget(table, area);
}

fn trend_lines(summary: &Summary) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        "Average price by fuel type",
        Style::default().fg(Color::Magenta),
    ))];
    lines.extend(bar_lines(
        summary
            .price_by_fuel
            .entries
            .iter()
            .map(|(k, v)| (fmt_key(k), *v)),
    ));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Transmission split",
        Style::default().fg(Color::Magenta),
    )));
    lines.extend(bar_lines(
        summary
            .transmission_split
            .entries
            .iter()
            .map(|(k, n)| (fmt_key(k), Some(*n as f64))),
    ));

    if let Some(years) = &summary.year_distribution {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Listings per year",
            Style::default().fg(Color::Magenta),
        )));
        lines.extend(bar_lines(
            years
                .entries
                .iter()
                .map(|(k, n)| (fmt_key(k), Some(*n as f64))),
        ));
    }
    lines
}

fn bar_lines(entries: impl Iterator<Item = (String, Option<f64>)>) -> Vec<Line<'static>> {
    let entries: Vec<(String, Option<f64>)> = entries.collect();
    if entries.is_empty() {
        return vec![Line::from("  (no data)")];
    }
    let max = entries
        .iter()
        .filter_map(|(_, v)| *v)
        .fold(0.0f64, f64::max);
    let label_width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    entries
        .into_iter()
        .map(|(key, value)| {
            let len = match value {
                Some(v) if max > 0.0 => ((v / max) * BAR_WIDTH as f64).round() as usize,
                _ => 0,
            };
            Line::from(format!(
                "  {key:<label_width$} {} {}",
                "#".repeat(len),
                fmt_number(value)
            ))
        })
        .collect()
}

fn fmt_number(value: Option<f64>) -> String {
    value.map_or("N/A".to_string(), |v| format!("{:.2}", v))
}

fn fmt_value(value: Option<&Value>) -> String {
    value.map_or("N/A".to_string(), fmt_key)
}

fn fmt_key(value: &Value) -> String {
    match value {
        Value::Missing => "(missing)".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DashboardConfig;
    use ratatui::backend::TestBackend;

    const CSV: &str = "\
Name,Year,Fuel_Type,Transmission,Owner_Type,Price
Maruti Swift,2014,Petrol,Manual,First,4.5
Honda City,2016,Diesel,Automatic,Second,8.0
Maruti Alto,2014,Petrol,Manual,First,2.1
";

    fn session() -> Session {
        let raw = Table::from_reader(CSV.as_bytes()).unwrap();
        Session::from_table(&raw, DashboardConfig::default()).unwrap()
    }

    fn render(session: &Session, state: &mut UiState) -> String {
        let view = View::compute(session, state.page).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| draw(f, session, &view, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_overview_shows_kpis() {
        let mut state = UiState { page: 1, ..UiState::default() };
        let screen = render(&session(), &mut state);
        assert!(screen.contains("Total listings: 3"));
        assert!(screen.contains("Most common brand: Maruti"));
        assert!(screen.contains("Most common ownership: First"));
        assert!(screen.contains("Brand: All"));
        assert!(screen.contains("[x] Fuel: Petrol"));
    }

    #[test]
    fn test_data_tab_shows_page() {
        let mut state = UiState {
            page: 1,
            tab_index: 3,
            ..UiState::default()
        };
        let screen = render(&session(), &mut state);
        assert!(screen.contains("page 1/1"));
        assert!(screen.contains("Honda City"));
    }

    #[test]
    fn test_activate_toggles_filters() {
        let mut s = session();
        // Brand, Petrol, Diesel, Manual, Automatic
        activate(&mut s, 1);
        assert!(!s.selection.fuels.contains(&Value::text("Petrol")));
        activate(&mut s, 0);
        assert_eq!(s.selection.brand.as_deref(), Some("Honda"));
        activate(&mut s, 4);
        assert!(!s.selection.transmissions.contains(&Value::text("Automatic")));
        assert_eq!(s.filtered().unwrap().row_count(), 0);
        activate(&mut s, 99);
    }

    #[test]
    fn test_bar_lines_scale_to_max() {
        let lines = bar_lines(
            vec![("a".to_string(), Some(2.0)), ("bb".to_string(), Some(4.0)), ("c".to_string(), None)]
                .into_iter(),
        );
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], format!("  a  {} 2.00", "#".repeat(20)));
        assert_eq!(text[1], format!("  bb {} 4.00", "#".repeat(40)));
        assert_eq!(text[2], "  c   N/A");
    }
}
