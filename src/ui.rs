pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::App;
use quizr::question::plain_text;
use quizr::QuizState;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn centered_message(f: &mut Frame, lines: Vec<Line>) {
    let area = f.area();
    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(widget, chunks[1]);
}

// hint like "(←) back", dimmed when the action is unavailable
fn hint(key: &str, label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        bold()
    } else {
        dim().add_modifier(Modifier::CROSSED_OUT)
    };
    Span::styled(format!("({key}) {label}   "), style)
}

pub fn render_loading(app: &App, f: &mut Frame) {
    let frame = SPINNER[app.spinner_frame % SPINNER.len()];
    centered_message(
        f,
        vec![
            Line::from(Span::styled(
                format!("{frame} Loading questions..."),
                bold().fg(Color::Cyan),
            )),
            Line::from(Span::styled("(esc) quit", dim())),
        ],
    );
}

pub fn render_empty(_app: &App, f: &mut Frame) {
    centered_message(
        f,
        vec![
            Line::from(Span::styled(
                "No questions available",
                bold().fg(Color::Yellow),
            )),
            Line::from(""),
            Line::from(Span::styled("(r) retry   (esc) quit", dim())),
        ],
    );
}

pub fn render_question(app: &App, f: &mut Frame) {
    let session = &app.session;
    let (Some(question), Some(pager)) = (session.current_question(), session.pager()) else {
        return;
    };
    let index = pager.index();
    let answered = matches!(session.state(), QuizState::Answered(_));
    let selected = session.ledger().selection(index);

    let area = f.area();
    let inner_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1) as usize;
    let question_text = plain_text(&question.question_text);
    let question_lines = (question_text.width() / inner_width + 1) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),                                  // header
            Constraint::Length(question_lines + 1),                 // question
            Constraint::Length(session.answers().len() as u16 + 1), // answers
            Constraint::Min(0),                                     // padding
            Constraint::Length(1),                                  // status
            Constraint::Length(1),                                  // key hints
        ])
        .split(area);

    let mut title = format!(
        "Question {} of {}   Score {}",
        index + 1,
        pager.len(),
        session.score()
    );
    if let Some(category) = &question.category {
        title = format!("{title}   {}", plain_text(category));
    }
    if let Some(difficulty) = &question.difficulty {
        title = format!("{title}   [{difficulty}]");
    }
    let header = Paragraph::new(Span::styled(title, bold().fg(Color::Cyan)))
        .block(Block::default().borders(Borders::ALL).title("quizr"))
        .alignment(Alignment::Center);
    f.render_widget(header, chunks[0]);

    let prompt = Paragraph::new(Span::styled(question_text, bold()))
        .alignment(if question_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    f.render_widget(prompt, chunks[1]);

    let answer_lines = session
        .answers()
        .iter()
        .enumerate()
        .map(|(slot, answer)| {
            let label = format!("{}. {}", slot + 1, plain_text(answer));
            let is_selected = selected == Some(answer.as_str());
            let style = match (answered, question.is_correct(answer), is_selected) {
                (false, _, _) => bold(),
                (true, true, _) => bold().fg(Color::Green),
                (true, false, true) => bold().fg(Color::Red),
                (true, false, false) => dim(),
            };
            let marker = if answered && is_selected {
                "> "
            } else {
                "  "
            };
            Line::from(Span::styled(format!("{marker}{label}"), style))
        })
        .collect::<Vec<Line>>();
    f.render_widget(Paragraph::new(answer_lines), chunks[2]);

    render_status(app, f, chunks[4]);

    let hints = Line::from(vec![
        hint(&format!("1-{}", session.answers().len()), "answer", !answered),
        hint("←", "back", !pager.is_first()),
        hint("→", "next", !pager.is_last()),
        hint("s", "save", true),
        hint("enter", "submit", true),
        hint("esc", "quit", true),
    ]);
    f.render_widget(Paragraph::new(hints).alignment(Alignment::Center), chunks[5]);
}

fn render_status(app: &App, f: &mut Frame, area: Rect) {
    let text = match (&app.status, app.cache_status()) {
        (Some(status), _) => Span::styled(status.clone(), Style::default().fg(Color::Yellow)),
        (None, Some(cache)) => Span::styled(cache, dim().add_modifier(Modifier::ITALIC)),
        (None, None) => Span::raw(""),
    };
    f.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

pub fn render_results(app: &App, f: &mut Frame) {
    let Some(results) = &app.results else {
        centered_message(
            f,
            vec![Line::from(Span::styled(
                "No submitted results",
                bold().fg(Color::Yellow),
            ))],
        );
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3), // score
            Constraint::Min(1),    // answers
            Constraint::Length(1), // status
            Constraint::Length(1), // key hints
        ])
        .split(f.area());

    let total = results.total();
    let percent = if total > 0 {
        results.score as usize * 100 / total
    } else {
        0
    };
    let score = Paragraph::new(Span::styled(
        format!("{} / {} correct   {}%", results.score, total, percent),
        bold().fg(Color::Magenta),
    ))
    .block(Block::default().borders(Borders::ALL).title("Results"))
    .alignment(Alignment::Center);
    f.render_widget(score, chunks[0]);

    let questions = app.session.questions();
    let lines = results
        .selected_answers
        .iter()
        .enumerate()
        .map(|(i, selection)| {
            let question = questions.get(i);
            let (mark, style) = match (selection, question) {
                (None, _) => ("-", dim()),
                (Some(answer), Some(q)) if q.is_correct(answer) => ("✓", bold().fg(Color::Green)),
                (Some(_), Some(_)) => ("✗", bold().fg(Color::Red)),
                (Some(_), None) => (" ", bold()),
            };
            let answer = selection
                .as_deref()
                .map(plain_text)
                .unwrap_or_else(|| "(skipped)".to_string());
            let mut spans = vec![Span::styled(format!("{mark} {:>2}. {answer}", i + 1), style)];
            if let (Some(q), Some(answer)) = (question, selection) {
                if !q.is_correct(answer) {
                    spans.push(Span::styled(
                        format!("   answer: {}", plain_text(&q.correct_answer)),
                        dim(),
                    ));
                }
            }
            Line::from(spans)
        })
        .collect::<Vec<Line>>();
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), chunks[1]);

    render_status(app, f, chunks[2]);

    let hints = Line::from(vec![
        hint("n", "new quiz", true),
        hint("s", "save", true),
        hint("esc", "quit", true),
    ]);
    f.render_widget(Paragraph::new(hints).alignment(Alignment::Center), chunks[3]);
}
