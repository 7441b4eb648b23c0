use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use study::Trial;
use study::trial::{Block as Content, ChoiceQuestion, Stimulus, TextQuestion};

use crate::app::{Controls, TrialView};
use crate::theme;

/// Create a styled block with rounded corners
fn styled_block(title: &str, is_focused: bool) -> Block<'_> {
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_type(theme::BORDER_TYPE)
        .border_style(if is_focused {
            Style::default().fg(theme::FOCUSED)
        } else {
            Style::default()
        })
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub fn draw(frame: &mut Frame, trial: &Trial, view: &TrialView) {
    let controls_height = match view.controls {
        Controls::Buttons { .. } => 3,
        Controls::Answer { .. } => 4,
        Controls::None | Controls::TextForm { .. } | Controls::ChoiceForm { .. } => 0,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(controls_height),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let title = format!(
        "Step {} of {}",
        view.trial_index,
        view.trial_count.saturating_sub(1)
    );

    match (trial, &view.controls) {
        (Trial::FreeTextSurvey { questions }, Controls::TextForm { values, focus }) => {
            let lines = text_form_lines(questions, values, *focus);
            draw_lines(frame, &title, lines, view.scroll, chunks[0]);
        }
        (
            Trial::MultipleChoiceSurvey { questions },
            Controls::ChoiceForm {
                cursor,
                selected,
                focus,
                touched: _,
            },
        ) => {
            let lines = choice_form_lines(questions, cursor, selected, *focus);
            draw_lines(frame, &title, lines, view.scroll, chunks[0]);
        }
        (Trial::Informational(b) | Trial::Break(b), _) => {
            let lines = stimulus_lines(&b.stimulus, &view.missing_images);
            draw_lines(frame, &title, lines, view.scroll, chunks[0]);
        }
        (Trial::Problem(p), _) => {
            let lines = stimulus_lines(&p.stimulus, &view.missing_images);
            draw_lines(frame, &title, lines, view.scroll, chunks[0]);
        }
        _ => {}
    }

    match (trial, &view.controls) {
        (_, Controls::Buttons { selected }) => {
            draw_buttons(frame, trial.choices(), *selected, chunks[1]);
        }
        (Trial::Problem(p), Controls::Answer { text, on_submit }) => {
            draw_answer(
                frame,
                &p.input_label,
                &p.input_placeholder,
                text,
                *on_submit,
                chunks[1],
            );
        }
        _ => {}
    }

    draw_status_bar(frame, view, chunks[2]);
}

fn draw_lines(frame: &mut Frame, title: &str, lines: Vec<Line<'static>>, scroll: u16, area: Rect) {
    let paragraph = Paragraph::new(lines)
        .block(styled_block(title, false))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Split `**emphasis**` markers into bold spans.
fn emphasis_spans(text: &str) -> Vec<Span<'static>> {
    text.split("**")
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if i % 2 == 1 {
                Span::styled(part.to_owned(), bold())
            } else {
                Span::raw(part.to_owned())
            }
        })
        .collect()
}

fn stimulus_lines(stimulus: &Stimulus, missing_images: &[String]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for block in &stimulus.blocks {
        match block {
            Content::Heading(text) => {
                lines.push(Line::styled(text.clone(), bold().fg(theme::HEADING)));
                lines.push(Line::from(""));
            }
            Content::Subheading(text) => {
                lines.push(Line::styled(text.clone(), bold()));
                lines.push(Line::from(""));
            }
            Content::Paragraph(text) => {
                lines.push(Line::from(emphasis_spans(text)));
                lines.push(Line::from(""));
            }
            Content::Bullets(items) => {
                for item in items {
                    let mut spans = vec![Span::raw("  • ")];
                    spans.extend(emphasis_spans(item));
                    lines.push(Line::from(spans));
                }
                lines.push(Line::from(""));
            }
            Content::Numbered(items) => {
                for (i, item) in items.iter().enumerate() {
                    let mut spans = vec![Span::raw(format!("  {}. ", i + 1))];
                    spans.extend(emphasis_spans(item));
                    lines.push(Line::from(spans));
                }
                lines.push(Line::from(""));
            }
            Content::Caption(text) => {
                lines.push(Line::styled(
                    text.clone(),
                    Style::default().fg(theme::CAPTION),
                ));
                lines.push(Line::from(""));
            }
            Content::Image(image) => {
                if missing_images.iter().any(|m| m == image) {
                    lines.push(Line::styled(
                        format!("[image missing: {image}]"),
                        bold().fg(theme::ERROR),
                    ));
                } else {
                    lines.push(Line::styled(
                        format!("[code image: {image}]  Ctrl-O opens it"),
                        Style::default().fg(theme::IMAGE),
                    ));
                }
                lines.push(Line::from(""));
            }
        }
    }
    lines
}

fn text_form_lines(questions: &[TextQuestion], values: &[String], focus: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, (question, value)) in questions.iter().zip(values).enumerate() {
        let marker = if question.required { " *" } else { "" };
        let focused = i == focus;
        lines.push(Line::styled(
            format!("{}{marker}", question.prompt),
            if focused {
                bold().fg(theme::FOCUSED)
            } else {
                bold()
            },
        ));

        let field = if value.is_empty() && !focused {
            Span::styled(
                question.placeholder.clone().unwrap_or_default(),
                Style::default().fg(theme::PLACEHOLDER),
            )
        } else if focused {
            Span::styled(format!("{value}_"), Style::default().bg(theme::SELECTED_BG))
        } else {
            Span::raw(value.clone())
        };
        lines.push(Line::from(vec![Span::raw("  > "), field]));
        lines.push(Line::from(""));
    }
    lines
}

fn choice_form_lines(
    questions: &[ChoiceQuestion],
    cursor: &[usize],
    selected: &[Option<usize>],
    focus: usize,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (q, question) in questions.iter().enumerate() {
        let focused = q == focus;
        let marker = if question.required { " *" } else { "" };
        lines.push(Line::styled(
            format!("{}{marker}", question.prompt),
            if focused {
                bold().fg(theme::FOCUSED)
            } else {
                bold()
            },
        ));

        for (o, option) in question.options.iter().enumerate() {
            let chosen = selected.get(q).copied().flatten() == Some(o);
            let radio = if chosen { "(•)" } else { "( )" };
            let style = if focused && cursor.get(q) == Some(&o) {
                Style::default().bg(theme::SELECTED_BG)
            } else {
                Style::default()
            };
            lines.push(Line::styled(format!("  {radio} {option}"), style));
        }
        lines.push(Line::from(""));
    }
    lines
}

fn button_span(label: &str, selected: bool) -> Span<'static> {
    let style = if selected {
        bold().bg(theme::SELECTED_BG).fg(theme::FOCUSED)
    } else {
        Style::default()
    };
    Span::styled(format!("[ {label} ]"), style)
}

fn draw_buttons(frame: &mut Frame, choices: &[String], selected: usize, area: Rect) {
    let mut spans = Vec::new();
    for (i, label) in choices.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(button_span(label, i == selected));
    }
    let paragraph = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(styled_block("", true));
    frame.render_widget(paragraph, area);
}

fn draw_answer(
    frame: &mut Frame,
    label: &str,
    placeholder: &str,
    text: &str,
    on_submit: bool,
    area: Rect,
) {
    let field = if text.is_empty() {
        Span::styled(placeholder.to_owned(), Style::default().fg(theme::PLACEHOLDER))
    } else {
        Span::styled(text.to_owned(), bold())
    };
    let cursor = if on_submit { "" } else { "_" };
    let lines = vec![
        Line::from(vec![Span::raw(" "), field, Span::raw(cursor)]),
        Line::from(button_span("Submit", on_submit)),
    ];
    let paragraph = Paragraph::new(lines).block(styled_block(label, !on_submit));
    frame.render_widget(paragraph, area);
}

fn draw_status_bar(frame: &mut Frame, view: &TrialView, area: Rect) {
    if let Some(notice) = &view.notice {
        let color = if notice.is_error {
            theme::ERROR
        } else {
            theme::WARNING
        };
        let paragraph = Paragraph::new(Line::styled(notice.text.clone(), bold().fg(color)));
        frame.render_widget(paragraph, area);
        return;
    }

    let hints: &[(&str, &str)] = match view.controls {
        Controls::Buttons { .. } => &[("Select", "←/→"), ("Confirm", "Enter")],
        Controls::Answer { .. } => &[
            ("Submit", "Enter"),
            ("Submit button", "Tab"),
            ("Open code image", "Ctrl-O"),
        ],
        Controls::TextForm { .. } => &[("Next field", "Tab"), ("Continue", "Enter")],
        Controls::ChoiceForm { .. } => &[
            ("Move", "↑/↓"),
            ("Select", "Space"),
            ("Next question", "Tab"),
            ("Continue", "Enter"),
        ],
        Controls::None => &[],
    };

    // Format: "Action: key | Action: key | ..."
    let mut spans = Vec::new();
    for (i, (action, key)) in hints.iter().chain(&[("Quit", "Ctrl-C")]).enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(theme::HINT)));
        }
        spans.push(Span::styled(
            format!("{action}: {key}"),
            Style::default().fg(theme::HINT),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
