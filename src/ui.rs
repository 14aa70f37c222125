pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    assistant::Author,
    catalog::{Block as LessonBlock, Lesson, Sprint},
    celebration::Celebration,
    keyboard::{KeyboardDiagram, KEY_MAP, KEY_ROWS, PALETTE},
    navigation::ScreenView,
    App, LessonFocus, ScreenKind,
};

const HORIZONTAL_MARGIN: u16 = 2;
const SPRINT_CARD_HEIGHT: u16 = 6;
const DIAGRAM_PANE_HEIGHT: u16 = 10;
const ASSISTANT_PANE_HEIGHT: u16 = 10;

const APP_TITLE: &str = "iCode Classroom Hub";

pub fn render(app: &mut App, f: &mut Frame) {
    screen::current_screen(app).render(app, f);

    if app.celebration.is_active {
        render_celebration(&app.celebration, f.area(), f.buffer_mut());
    }
}

/// Header and footer shared by every screen; returns the body area.
fn render_chrome(app: &App, f: &mut Frame) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(f.area());

    let breadcrumb = app.nav.breadcrumb(&app.catalog);
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            APP_TITLE,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            breadcrumb,
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ])
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    render_footer(app, f, chunks[2]);

    chunks[1]
}

fn render_footer(app: &App, f: &mut Frame, area: Rect) {
    let text = if let Some(status) = &app.status {
        status.clone()
    } else {
        match app.screen_kind() {
            ScreenKind::Home => "(↑/↓) choose a sprint  (enter) open  (q)uit".to_string(),
            ScreenKind::Sprint => {
                "(↑/↓) choose a lesson  (enter) open  (esc) back  (q)uit".to_string()
            }
            ScreenKind::Lesson => match app.lesson_state.focus {
                LessonFocus::Content => {
                    let mut help =
                        String::from("(↑/↓) scroll  (←/→) prev/next lesson  (1-9) open activity");
                    if app.lesson_state.diagram.is_some() {
                        help.push_str("  (c)olor keys");
                    }
                    if app.assistant_enabled {
                        help.push_str("  (a)sk Codie");
                    }
                    help.push_str("  (esc) back");
                    help
                }
                LessonFocus::Coloring => {
                    "(arrows) move  (space) paint  (tab or 1-7) pick color  (esc) done".to_string()
                }
                LessonFocus::Assistant => {
                    "type your question  (enter) send  (esc) close".to_string()
                }
            },
        }
    };

    let style = if app.status.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC)
    };
    let footer = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(footer, area);
}

fn render_home(app: &mut App, f: &mut Frame, area: Rect) {
    let mut constraints: Vec<Constraint> = app
        .catalog
        .sprints
        .iter()
        .map(|_| Constraint::Length(SPRINT_CARD_HEIGHT))
        .collect();
    constraints.push(Constraint::Min(0));

    let cards = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(constraints)
        .split(area);

    for (idx, sprint) in app.catalog.sprints.iter().enumerate() {
        render_sprint_card(app, sprint, idx == app.home_state.cursor, f, cards[idx]);
    }
}

fn render_sprint_card(app: &App, sprint: &Sprint, selected: bool, f: &mut Frame, area: Rect) {
    let border_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(
            sprint.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(1)])
        .split(inner);

    let description = Paragraph::new(sprint.description.clone())
        .style(Style::default().add_modifier(Modifier::DIM))
        .wrap(Wrap { trim: true });
    f.render_widget(description, rows[0]);

    if sprint.lessons.is_empty() {
        let placeholder = Paragraph::new("Lessons coming soon!")
            .style(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM));
        f.render_widget(placeholder, rows[1]);
    } else {
        let done = app.progress.completed_in(sprint);
        let total = sprint.lessons.len();
        let gauge = Gauge::default()
            .ratio(app.progress.completion_ratio(sprint))
            .label(format!("{done}/{total} lessons completed"))
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black));
        f.render_widget(gauge, rows[1]);
    }
}

fn render_sprint(app: &mut App, f: &mut Frame, area: Rect) {
    let sprint = match app.nav.screen(&app.catalog) {
        ScreenView::SprintView(sprint) => sprint,
        _ => return,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    let description = Paragraph::new(sprint.description.clone())
        .style(Style::default().add_modifier(Modifier::DIM))
        .wrap(Wrap { trim: true });
    f.render_widget(description, chunks[0]);

    if sprint.lessons.is_empty() {
        let placeholder = Paragraph::new("Lessons for this sprint are coming soon!")
            .style(Style::default().add_modifier(Modifier::ITALIC))
            .alignment(Alignment::Center);
        f.render_widget(placeholder, chunks[1]);
        return;
    }

    let items: Vec<ListItem> = sprint
        .lessons
        .iter()
        .map(|lesson| {
            let check = if app.progress.is_completed(&lesson.id) {
                Span::styled(" ✓ ", Style::default().fg(Color::Green))
            } else {
                Span::raw("   ")
            };
            ListItem::new(Line::from(vec![check, Span::raw(lesson.title.clone())]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Lessons"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.sprint_state.cursor.min(sprint.lessons.len() - 1)));
    f.render_stateful_widget(list, chunks[1], &mut state);
}

fn render_lesson(app: &mut App, f: &mut Frame, area: Rect) {
    let lesson = match app.nav.screen(&app.catalog) {
        ScreenView::LessonView(_, lesson) => lesson,
        _ => return,
    };

    let (main, assistant_area) = if app.lesson_state.assistant.is_some() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(ASSISTANT_PANE_HEIGHT)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    let (text_area, diagram_area) = if app.lesson_state.diagram.is_some() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(DIAGRAM_PANE_HEIGHT)])
            .split(main);
        (chunks[0], Some(chunks[1]))
    } else {
        (main, None)
    };

    let lines = lesson_lines(lesson);

    // Clamp scrolling to the wrapped line count so Down cannot run away
    let text_width = text_area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1) as usize;
    let wrapped: usize = lines
        .iter()
        .map(|line| {
            let width: usize = line.spans.iter().map(|span| span.content.width()).sum();
            width.div_ceil(text_width).max(1)
        })
        .sum();
    let max_scroll = (wrapped as u16).saturating_sub(text_area.height);
    if app.lesson_state.scroll > max_scroll {
        app.lesson_state.scroll = max_scroll;
    }

    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.lesson_state.scroll, 0));
    let content_area = Layout::default()
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([Constraint::Min(0)])
        .split(text_area)[0];
    f.render_widget(content, content_area);

    if let (Some(diagram), Some(area)) = (app.lesson_state.diagram.as_ref(), diagram_area) {
        render_diagram(diagram, app.lesson_state.focus == LessonFocus::Coloring, f, area);
    }

    if let Some(area) = assistant_area {
        render_assistant(app, f, area);
    }
}

fn lesson_lines(lesson: &Lesson) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut link_no = 0;

    for block in &lesson.blocks {
        match block {
            LessonBlock::Heading { text } => {
                if !lines.is_empty() {
                    lines.push(Line::raw(""));
                }
                lines.push(Line::from(Span::styled(
                    text.clone(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )));
            }
            LessonBlock::Paragraph { text } => {
                lines.push(Line::raw(text.clone()));
            }
            LessonBlock::Bullets { items } => {
                for item in items {
                    lines.push(Line::from(vec![
                        Span::styled("  • ", Style::default().fg(Color::Yellow)),
                        Span::raw(item.clone()),
                    ]));
                }
            }
            LessonBlock::Link { label, url } => {
                link_no += 1;
                lines.push(link_line(link_no, label, url));
            }
            LessonBlock::Embed { title, url } => {
                link_no += 1;
                lines.push(link_line(link_no, title, url));
            }
            // The diagram renders in its own pane below the text
            LessonBlock::KeyboardMap => {}
        }
    }

    lines
}

fn link_line(no: usize, label: &str, url: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  [{no}] "), Style::default().fg(Color::Yellow)),
        Span::styled(
            label.to_string(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::UNDERLINED),
        ),
        Span::styled(format!("  {url}"), Style::default().add_modifier(Modifier::DIM)),
    ])
}

fn render_diagram(diagram: &KeyboardDiagram, focused: bool, f: &mut Frame, area: Rect) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title("Keyboard Coloring Map");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let cursor_id = diagram.cursor_region().id;
    let mut lines: Vec<Line> = Vec::with_capacity(KEY_ROWS + 2);

    for row in 0..KEY_ROWS {
        let mut spans = Vec::new();
        for key in KEY_MAP.iter().filter(|k| k.row == row) {
            let mut style = match diagram.region_color(key.id) {
                Some(color) => {
                    let (r, g, b) = color.rgb();
                    Style::default().bg(Color::Rgb(r, g, b)).fg(Color::Black)
                }
                None => Style::default().bg(Color::DarkGray).fg(Color::White),
            };
            if focused && key.id == cursor_id {
                style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
            }
            spans.push(Span::styled(
                format!("{:^width$}", key.label, width = key.width as usize),
                style,
            ));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::raw(""));

    let mut palette_spans = vec![Span::raw("Colors: ")];
    for color in PALETTE {
        let (r, g, b) = color.rgb();
        let selected = color == diagram.selected_color();
        let label = if selected {
            format!("[{color}]")
        } else {
            format!(" {color} ")
        };
        let mut style = Style::default().bg(Color::Rgb(r, g, b)).fg(Color::Black);
        if selected {
            style = style.add_modifier(Modifier::BOLD);
        }
        palette_spans.push(Span::styled(label, style));
        palette_spans.push(Span::raw(" "));
    }
    lines.push(Line::from(palette_spans));

    f.render_widget(Paragraph::new(lines), inner);
}

fn render_assistant(app: &App, f: &mut Frame, area: Rect) {
    let Some(session) = app.lesson_state.assistant.as_ref() else {
        return;
    };

    let focused = app.lesson_state.focus == LessonFocus::Assistant;
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title("Ask Codie");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let mut lines: Vec<Line> = Vec::new();
    if !app.generator.enabled() {
        lines.push(Line::from(Span::styled(
            "(Codie is offline right now, ask your teacher to set HUB_AI_API_KEY)",
            Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC),
        )));
    }
    for message in session.messages() {
        let (name, style) = match message.author {
            Author::Learner => ("You", Style::default().fg(Color::Yellow)),
            Author::Helper => ("Codie", Style::default().fg(Color::Green)),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] {name}: ", message.at.format("%H:%M")),
                style.add_modifier(Modifier::BOLD),
            ),
            Span::raw(message.text.clone()),
        ]));
    }
    if session.is_pending() {
        let dots = ".".repeat(((app.tick / 3) % 4) as usize);
        lines.push(Line::from(Span::styled(
            format!("Codie is thinking{dots}"),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the tail of the conversation in view
    let width = chunks[0].width.max(1) as usize;
    let wrapped: usize = lines
        .iter()
        .map(|line| {
            let w: usize = line.spans.iter().map(|span| span.content.width()).sum();
            w.div_ceil(width).max(1)
        })
        .sum();
    let scroll = (wrapped as u16).saturating_sub(chunks[0].height);

    let transcript = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(transcript, chunks[0]);

    let cursor = if focused { "█" } else { "" };
    let input = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::raw(app.lesson_state.input.clone()),
        Span::styled(cursor, Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]));
    f.render_widget(input, chunks[1]);
}

/// Paint the celebration on top of whatever screen is showing
fn render_celebration(celebration: &Celebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        let x = particle.x as u16;
        let y = particle.y as u16;

        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];
            let alpha = 1.0 - (particle.age / particle.max_age);
            let style = if alpha > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if alpha > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(style);
            }
        }
    }

    let word = celebration.word;
    let y = area.y + area.height / 2;
    let start_x = area.x + area.width.saturating_sub(word.len() as u16) / 2;
    for (i, ch) in word.chars().enumerate() {
        if let Some(cell) = buf.cell_mut((start_x + i as u16, y)) {
            cell.set_symbol(&ch.to_string());
            cell.set_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        }
    }
}
