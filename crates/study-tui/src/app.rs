//! Per-trial view state and the terminal [`Presenter`].
//!
//! [`TrialView`] is pure: it turns key events into edits of its own state or
//! into an [`Action`]. [`TuiPresenter`] owns the terminal, draws the view and
//! feeds it events until the trial is submitted.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::Backend};
use study::assets::AssetResolver;
use study::engine::{PresentContext, Presenter, form, validate_response};
use study::record::Response;
use study::trial::{ChoiceQuestion, TextQuestion};
use study::{AnswerCapture, StudyError, Trial};

use crate::event::{AppEvent, EventSource};
use crate::ui;

const TICK: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// Interactive part of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controls {
    None,
    Buttons {
        selected: usize,
    },
    /// Problem answer field plus its submit button.
    Answer {
        text: String,
        on_submit: bool,
    },
    TextForm {
        values: Vec<String>,
        focus: usize,
    },
    /// `touched` marks questions whose cursor the participant has moved;
    /// Enter only picks the highlighted option on those.
    ChoiceForm {
        cursor: Vec<usize>,
        selected: Vec<Option<usize>>,
        touched: Vec<bool>,
        focus: usize,
    },
}

/// One-line message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }
}

/// What the presenter should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Submit(Response),
    Abort,
    OpenImage(String),
}

#[derive(Debug, Clone)]
pub struct TrialView {
    pub trial_index: usize,
    pub trial_count: usize,
    pub controls: Controls,
    pub scroll: u16,
    pub notice: Option<Notice>,
    pub missing_images: Vec<String>,
    numeric_only: bool,
}

impl TrialView {
    pub fn new(trial: &Trial, trial_index: usize, trial_count: usize, numeric_only: bool) -> Self {
        let controls = match trial {
            Trial::Preload { .. } => Controls::None,
            Trial::Informational(_) | Trial::Break(_) => Controls::Buttons { selected: 0 },
            Trial::Problem(_) => Controls::Answer {
                text: String::new(),
                on_submit: false,
            },
            Trial::FreeTextSurvey { questions } => Controls::TextForm {
                values: vec![String::new(); questions.len()],
                focus: 0,
            },
            Trial::MultipleChoiceSurvey { questions } => Controls::ChoiceForm {
                cursor: vec![0; questions.len()],
                selected: vec![None; questions.len()],
                touched: vec![false; questions.len()],
                focus: 0,
            },
        };
        Self {
            trial_index,
            trial_count,
            controls,
            scroll: 0,
            notice: None,
            missing_images: Vec::new(),
            numeric_only,
        }
    }

    pub fn handle_key(
        &mut self,
        trial: &Trial,
        key: KeyEvent,
        answer: Option<&mut AnswerCapture>,
    ) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Action::Abort,
                KeyCode::Char('o') => trial
                    .problem()
                    .map_or(Action::None, |p| Action::OpenImage(p.image.clone())),
                _ => Action::None,
            };
        }

        let Self {
            controls,
            scroll,
            notice,
            numeric_only,
            ..
        } = self;

        match key.code {
            KeyCode::PageUp => {
                *scroll = scroll.saturating_sub(5);
                return Action::None;
            }
            KeyCode::PageDown => {
                *scroll = scroll.saturating_add(5);
                return Action::None;
            }
            _ => {}
        }

        match (controls, trial) {
            (Controls::Buttons { selected }, _) => {
                buttons_key(selected, scroll, trial.choices().len(), key.code)
            }
            (Controls::Answer { text, on_submit }, _) => {
                answer_key(text, on_submit, scroll, *numeric_only, key.code, answer)
            }
            (Controls::TextForm { values, focus }, Trial::FreeTextSurvey { questions }) => {
                if text_form_key(values, focus, key.code) {
                    let response = text_response(questions, values);
                    checked(trial, response, notice)
                } else {
                    Action::None
                }
            }
            (
                Controls::ChoiceForm {
                    cursor,
                    selected,
                    touched,
                    focus,
                },
                Trial::MultipleChoiceSurvey { questions },
            ) => {
                let mut state = ChoiceFormState {
                    cursor,
                    selected: &mut selected[..],
                    touched,
                    focus,
                };
                if choice_form_key(&mut state, questions, key.code, notice) {
                    let response = choice_response(questions, selected);
                    checked(trial, response, notice)
                } else {
                    Action::None
                }
            }
            _ => Action::None,
        }
    }

    /// Bracketed paste into the focused text field.
    pub fn paste(&mut self, pasted: &str, answer: Option<&mut AnswerCapture>) {
        match &mut self.controls {
            Controls::Answer {
                text,
                on_submit: false,
            } => {
                let before = text.len();
                text.extend(pasted.chars().filter(|&c| accepts(c, self.numeric_only)));
                if text.len() != before {
                    if let Some(capture) = answer {
                        capture.input_changed(field_value(text, self.numeric_only));
                    }
                }
            }
            Controls::TextForm { values, focus } => {
                if let Some(value) = values.get_mut(*focus) {
                    value.extend(pasted.chars().filter(|c| !c.is_control()));
                }
            }
            _ => {}
        }
    }
}

/// Whether the answer field takes `c`. Number mode only takes characters
/// that can appear in a number literal.
fn accepts(c: char, numeric_only: bool) -> bool {
    if c.is_control() {
        return false;
    }
    !numeric_only || c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')
}

/// The value the answer field reports. In number mode, text that is not a
/// complete number literal (`"7651-e+"`, `"-"`) reads as empty.
fn field_value(text: &str, numeric_only: bool) -> &str {
    if !numeric_only || text.parse::<f64>().is_ok() {
        text
    } else {
        ""
    }
}

fn buttons_key(selected: &mut usize, scroll: &mut u16, count: usize, code: KeyCode) -> Action {
    match code {
        KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => {
            *selected = selected.saturating_sub(1);
        }
        KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => {
            *selected = (*selected + 1).min(count.saturating_sub(1));
        }
        KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => *scroll = scroll.saturating_add(1),
        KeyCode::Enter | KeyCode::Char(' ') if count > 0 => {
            return Action::Submit(Response::Button(*selected));
        }
        _ => {}
    }
    Action::None
}

fn answer_key(
    text: &mut String,
    on_submit: &mut bool,
    scroll: &mut u16,
    numeric_only: bool,
    code: KeyCode,
    answer: Option<&mut AnswerCapture>,
) -> Action {
    match code {
        KeyCode::Tab | KeyCode::BackTab => *on_submit = !*on_submit,
        KeyCode::Up => *scroll = scroll.saturating_sub(1),
        KeyCode::Down => *scroll = scroll.saturating_add(1),
        // Clicking Submit: no commit, the last input event stands.
        KeyCode::Enter | KeyCode::Char(' ') if *on_submit => {
            return Action::Submit(Response::Button(0));
        }
        KeyCode::Enter => {
            if let Some(capture) = answer {
                if capture.commit(field_value(text, numeric_only)) {
                    return Action::Submit(Response::Button(0));
                }
            }
        }
        KeyCode::Char(c) if !*on_submit => {
            if accepts(c, numeric_only) {
                text.push(c);
                if let Some(capture) = answer {
                    capture.input_changed(field_value(text, numeric_only));
                }
            }
        }
        KeyCode::Backspace if !*on_submit => {
            if text.pop().is_some() {
                if let Some(capture) = answer {
                    capture.input_changed(field_value(text, numeric_only));
                }
            }
        }
        _ => {}
    }
    Action::None
}

/// Returns `true` when the form should be submitted.
fn text_form_key(values: &mut [String], focus: &mut usize, code: KeyCode) -> bool {
    let len = values.len();
    match code {
        KeyCode::Tab | KeyCode::Down if len > 0 => *focus = (*focus + 1) % len,
        KeyCode::BackTab | KeyCode::Up if len > 0 => *focus = (*focus + len - 1) % len,
        KeyCode::Char(c) => {
            if let Some(value) = values.get_mut(*focus) {
                value.push(c);
            }
        }
        KeyCode::Backspace => {
            if let Some(value) = values.get_mut(*focus) {
                value.pop();
            }
        }
        KeyCode::Enter => {
            if *focus + 1 < len {
                *focus += 1;
            } else {
                return true;
            }
        }
        _ => {}
    }
    false
}

struct ChoiceFormState<'a> {
    cursor: &'a mut [usize],
    selected: &'a mut [Option<usize>],
    touched: &'a mut [bool],
    focus: &'a mut usize,
}

/// Returns `true` when the form should be submitted.
///
/// Enter on an untouched question keeps its current choice (none on a fresh
/// form). While a required question is unanswered, Enter moves focus there;
/// if that question is the focused one, a notice names it.
fn choice_form_key(
    form: &mut ChoiceFormState<'_>,
    questions: &[ChoiceQuestion],
    code: KeyCode,
    notice: &mut Option<Notice>,
) -> bool {
    let len = questions.len();
    let Some(question) = questions.get(*form.focus) else {
        return code == KeyCode::Enter;
    };
    let last_option = question.options.len().saturating_sub(1);
    let f = *form.focus;

    match code {
        KeyCode::Up | KeyCode::Char('k') => {
            form.cursor[f] = form.cursor[f].saturating_sub(1);
            form.touched[f] = true;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            form.cursor[f] = (form.cursor[f] + 1).min(last_option);
            form.touched[f] = true;
        }
        KeyCode::Char(' ') => {
            form.selected[f] = Some(form.cursor[f]);
            form.touched[f] = true;
        }
        KeyCode::Tab => *form.focus = (f + 1) % len,
        KeyCode::BackTab => *form.focus = (f + len - 1) % len,
        KeyCode::Enter => {
            if form.touched[f] {
                form.selected[f] = Some(form.cursor[f]);
            }
            let unanswered = questions
                .iter()
                .zip(form.selected.iter())
                .position(|(q, s)| q.required && s.is_none());
            match unanswered {
                Some(next) if next == f => {
                    *notice = Some(Notice::error(format!("please answer: {}", question.name)));
                }
                Some(next) => *form.focus = next,
                None => return true,
            }
        }
        _ => {}
    }
    false
}

fn text_response(questions: &[TextQuestion], values: &[String]) -> Response {
    form(
        questions
            .iter()
            .zip(values)
            .map(|(q, v)| (q.name.clone(), v.clone())),
    )
}

fn choice_response(questions: &[ChoiceQuestion], selected: &[Option<usize>]) -> Response {
    form(questions.iter().zip(selected).filter_map(|(q, s)| {
        s.and_then(|i| q.options.get(i))
            .map(|o| (q.name.clone(), o.clone()))
    }))
}

/// Validate locally so the participant gets feedback without a round trip.
fn checked(trial: &Trial, response: Response, notice: &mut Option<Notice>) -> Action {
    match validate_response(trial, &response) {
        Ok(()) => Action::Submit(response),
        Err(e) => {
            *notice = Some(Notice::error(e.to_string()));
            Action::None
        }
    }
}

// ---------------------------------------------------------------------------
// Image viewer
// ---------------------------------------------------------------------------

fn open_command(path: &Path) -> Command {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    command.arg(path);
    command
}

/// Open a problem image in the system viewer.
pub fn open_image(assets: &AssetResolver, image: &str) -> Notice {
    let status = assets.status(image);
    if !status.found {
        return Notice::error(format!("image not found: {}", status.path.display()));
    }

    let spawned = open_command(&status.path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(mut child) => {
            tracing::info!(image, path = %status.path.display(), "opened image viewer");
            std::thread::spawn(move || child.wait());
            Notice::info(format!("opened {image} in the image viewer"))
        }
        Err(e) => {
            tracing::warn!(image, error = %e, "could not open image viewer");
            Notice::error(format!("could not open {}: {e}", status.path.display()))
        }
    }
}

// ---------------------------------------------------------------------------
// Presenter
// ---------------------------------------------------------------------------

/// Presents trials in a terminal.
pub struct TuiPresenter<B: Backend, E: EventSource> {
    terminal: Terminal<B>,
    events: E,
    numeric_only: bool,
    /// View of the last presented trial, kept so a rejected form keeps its
    /// answers.
    view: Option<TrialView>,
}

impl<B: Backend, E: EventSource> TuiPresenter<B, E> {
    pub fn new(terminal: Terminal<B>, events: E, numeric_only: bool) -> Self {
        Self {
            terminal,
            events,
            numeric_only,
            view: None,
        }
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    fn drive(
        &mut self,
        trial: &Trial,
        ctx: &mut PresentContext<'_>,
        view: &mut TrialView,
    ) -> Result<Response, StudyError> {
        loop {
            self.terminal
                .draw(|frame| ui::draw(frame, trial, view))
                .map_err(|e| StudyError::Presentation(format!("drawing the screen: {e}")))?;

            let event = self
                .events
                .next_event(TICK)
                .map_err(|e| StudyError::Presentation(e.to_string()))?;
            let action = match event {
                AppEvent::Key(key) if key.kind != KeyEventKind::Release => {
                    view.handle_key(trial, key, ctx.answer.as_deref_mut())
                }
                AppEvent::Paste(text) => {
                    view.paste(&text, ctx.answer.as_deref_mut());
                    Action::None
                }
                AppEvent::Key(_) | AppEvent::Resize { .. } | AppEvent::Tick => Action::None,
            };

            match action {
                Action::None => {}
                Action::Submit(response) => return Ok(response),
                Action::Abort => return Err(StudyError::Aborted),
                Action::OpenImage(image) => view.notice = Some(open_image(ctx.assets, &image)),
            }
        }
    }
}

impl<B: Backend, E: EventSource> Presenter for TuiPresenter<B, E> {
    fn present(
        &mut self,
        trial: &Trial,
        ctx: &mut PresentContext<'_>,
    ) -> Result<Response, StudyError> {
        let mut view = match self.view.take() {
            Some(v) if ctx.rejection.is_some() && v.trial_index == ctx.trial_index => v,
            _ => TrialView::new(trial, ctx.trial_index, ctx.trial_count, self.numeric_only),
        };
        view.missing_images = ctx.missing_images.to_vec();
        if let Some(rejection) = ctx.rejection {
            view.notice = Some(Notice::error(rejection.to_string()));
        }

        let result = self.drive(trial, ctx, &mut view);
        self.view = Some(view);
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use ratatui::backend::TestBackend;
    use study::capture::CaptureState;
    use study::trial::TrialLifecycle;
    use study::{Catalog, ParticipantAnswer, Timeline};

    use super::*;

    fn trial(index: usize) -> Trial {
        Timeline::build(&Catalog::default()).trials()[index].clone()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn focused_capture(trial: &Trial) -> AnswerCapture {
        let mut capture = AnswerCapture::new(trial.problem().unwrap().metadata.clone());
        capture.on_enter();
        capture
    }

    fn type_text(view: &mut TrialView, trial: &Trial, text: &str, capture: &mut AnswerCapture) {
        for c in text.chars() {
            assert_eq!(
                view.handle_key(trial, key(KeyCode::Char(c)), Some(capture)),
                Action::None
            );
        }
    }

    #[test]
    fn enter_in_answer_field_commits_and_submits() {
        let problem = trial(5);
        let mut view = TrialView::new(&problem, 5, 16, true);
        let mut capture = focused_capture(&problem);

        type_text(&mut view, &problem, "7651", &mut capture);
        let action = view.handle_key(&problem, key(KeyCode::Enter), Some(&mut capture));

        assert_eq!(action, Action::Submit(Response::Button(0)));
        assert_eq!(capture.state(), CaptureState::Committed);
        assert!(capture.finalize().is_correct);
    }

    #[test]
    fn numeric_mode_drops_letters() {
        let problem = trial(5);
        let mut view = TrialView::new(&problem, 5, 16, true);
        let mut capture = focused_capture(&problem);

        type_text(&mut view, &problem, "7a6x", &mut capture);
        assert_eq!(capture.buffer(), Some("76"));

        let mut free = TrialView::new(&problem, 5, 16, false);
        let mut capture = focused_capture(&problem);
        type_text(&mut free, &problem, "7a", &mut capture);
        assert_eq!(capture.buffer(), Some("7a"));
    }

    #[test]
    fn backspace_updates_buffer() {
        let problem = trial(5);
        let mut view = TrialView::new(&problem, 5, 16, true);
        let mut capture = focused_capture(&problem);
        type_text(&mut view, &problem, "955", &mut capture);
        view.handle_key(&problem, key(KeyCode::Backspace), Some(&mut capture));
        assert_eq!(capture.buffer(), Some("95"));
    }

    #[test]
    fn submit_button_uses_last_input_without_commit() {
        let problem = trial(7);
        let mut view = TrialView::new(&problem, 7, 16, true);
        let mut capture = focused_capture(&problem);

        type_text(&mut view, &problem, "954", &mut capture);
        assert_eq!(
            view.handle_key(&problem, key(KeyCode::Tab), Some(&mut capture)),
            Action::None
        );
        // Typing on the button does nothing.
        view.handle_key(&problem, key(KeyCode::Char('1')), Some(&mut capture));
        let action = view.handle_key(&problem, key(KeyCode::Enter), Some(&mut capture));

        assert_eq!(action, Action::Submit(Response::Button(0)));
        assert_eq!(capture.state(), CaptureState::InputFocused);
        let outcome = capture.finalize();
        assert_eq!(outcome.participant_answer, ParticipantAnswer::Integer(954));
        assert!(outcome.is_correct);
    }

    #[test]
    fn enter_without_wired_input_does_nothing() {
        let problem = trial(5);
        let mut view = TrialView::new(&problem, 5, 16, true);
        view.handle_key(&problem, key(KeyCode::Char('1')), None);
        assert_eq!(view.handle_key(&problem, key(KeyCode::Enter), None), Action::None);
    }

    #[test]
    fn control_keys() {
        let problem = trial(5);
        let welcome = trial(1);
        let mut view = TrialView::new(&problem, 5, 16, true);
        assert_eq!(view.handle_key(&problem, ctrl('c'), None), Action::Abort);
        assert_eq!(
            view.handle_key(&problem, ctrl('o'), None),
            Action::OpenImage("problem_1.png".to_owned())
        );
        let mut view = TrialView::new(&welcome, 1, 16, true);
        assert_eq!(view.handle_key(&welcome, ctrl('o'), None), Action::None);
    }

    #[test]
    fn buttons_submit_selected_index() {
        let welcome = trial(1);
        let mut view = TrialView::new(&welcome, 1, 16, true);
        // Only one button: moving right stays on it.
        view.handle_key(&welcome, key(KeyCode::Right), None);
        assert_eq!(
            view.handle_key(&welcome, key(KeyCode::Enter), None),
            Action::Submit(Response::Button(0))
        );
    }

    #[test]
    fn text_form_validates_before_submit() {
        let info = trial(2);
        let mut view = TrialView::new(&info, 2, 16, true);
        for c in "Ada".chars() {
            view.handle_key(&info, key(KeyCode::Char(c)), None);
        }
        assert_eq!(view.handle_key(&info, key(KeyCode::Enter), None), Action::None);
        assert_eq!(view.handle_key(&info, key(KeyCode::Enter), None), Action::None);
        assert_eq!(
            view.notice.as_ref().map(|n| n.text.as_str()),
            Some("please answer: email")
        );

        for c in "ada@example.org".chars() {
            view.handle_key(&info, key(KeyCode::Char(c)), None);
        }
        assert_eq!(
            view.handle_key(&info, key(KeyCode::Enter), None),
            Action::Submit(form([("name", "Ada"), ("email", "ada@example.org")]))
        );
    }

    #[test]
    fn choice_form_walks_questions() {
        let demographics = trial(3);
        let mut view = TrialView::new(&demographics, 3, 16, true);

        // programming_exp: third option
        view.handle_key(&demographics, key(KeyCode::Down), None);
        view.handle_key(&demographics, key(KeyCode::Down), None);
        assert_eq!(view.handle_key(&demographics, key(KeyCode::Enter), None), Action::None);
        // solidity_exp: first option, chosen explicitly
        view.handle_key(&demographics, key(KeyCode::Char(' ')), None);
        assert_eq!(view.handle_key(&demographics, key(KeyCode::Enter), None), Action::None);
        // role: fourth option
        for _ in 0..3 {
            view.handle_key(&demographics, key(KeyCode::Down), None);
        }
        let action = view.handle_key(&demographics, key(KeyCode::Enter), None);

        assert_eq!(
            action,
            Action::Submit(form([
                ("programming_exp", "3-5 years"),
                ("solidity_exp", "None"),
                ("role", "Researcher"),
            ]))
        );
    }

    #[test]
    fn choice_form_enter_alone_never_submits() {
        let demographics = trial(3);
        let mut view = TrialView::new(&demographics, 3, 16, true);
        for _ in 0..3 {
            assert_eq!(view.handle_key(&demographics, key(KeyCode::Enter), None), Action::None);
        }
        let Controls::ChoiceForm { selected, focus, .. } = &view.controls else {
            panic!("expected choice form");
        };
        assert!(selected.iter().all(Option::is_none));
        assert_eq!(*focus, 0);
        let notice = view.notice.as_ref().unwrap();
        assert!(notice.is_error);
        assert_eq!(notice.text, "please answer: programming_exp");
    }

    #[test]
    fn choice_form_enter_jumps_to_first_unanswered() {
        let demographics = trial(3);
        let mut view = TrialView::new(&demographics, 3, 16, true);
        // Answer the last question first.
        view.handle_key(&demographics, key(KeyCode::BackTab), None);
        view.handle_key(&demographics, key(KeyCode::Down), None);
        assert_eq!(view.handle_key(&demographics, key(KeyCode::Enter), None), Action::None);

        let Controls::ChoiceForm { selected, focus, .. } = &view.controls else {
            panic!("expected choice form");
        };
        assert_eq!(selected[2], Some(1));
        assert_eq!(*focus, 0);
        assert!(view.notice.is_none());
    }

    #[test]
    fn choice_form_space_selects_without_advancing() {
        let demographics = trial(3);
        let mut view = TrialView::new(&demographics, 3, 16, true);
        view.handle_key(&demographics, key(KeyCode::Char(' ')), None);
        let Controls::ChoiceForm { selected, focus, .. } = &view.controls else {
            panic!("expected choice form");
        };
        assert_eq!(selected[0], Some(0));
        assert_eq!(*focus, 0);
    }

    #[test]
    fn malformed_number_reads_as_empty() {
        let problem = trial(5);
        let mut view = TrialView::new(&problem, 5, 16, true);
        let mut capture = focused_capture(&problem);
        type_text(&mut view, &problem, "7651-e+", &mut capture);
        assert_eq!(capture.buffer(), Some(""));

        let action = view.handle_key(&problem, key(KeyCode::Enter), Some(&mut capture));
        assert_eq!(action, Action::Submit(Response::Button(0)));
        let outcome = capture.finalize();
        assert_eq!(outcome.participant_answer, ParticipantAnswer::NotANumber);
        assert!(!outcome.is_correct);
    }

    #[test]
    fn free_text_mode_keeps_raw_text() {
        assert_eq!(field_value("7651-e+", false), "7651-e+");
        assert_eq!(field_value("1e3", true), "1e3");
        assert_eq!(field_value("-", true), "");
    }

    #[test]
    fn paste_into_answer_field() {
        let problem = trial(5);
        let mut view = TrialView::new(&problem, 5, 16, true);
        let mut capture = focused_capture(&problem);
        view.paste("76 51\n", Some(&mut capture));
        assert_eq!(capture.buffer(), Some("7651"));
    }

    fn presenter(events: Vec<AppEvent>) -> TuiPresenter<TestBackend, VecDeque<AppEvent>> {
        let terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        TuiPresenter::new(terminal, events.into(), true)
    }

    fn keys(text: &str) -> Vec<AppEvent> {
        text.chars()
            .map(|c| AppEvent::Key(key(KeyCode::Char(c))))
            .collect()
    }

    #[test]
    fn presenter_drives_problem_to_submit() {
        let problem = trial(5);
        let mut capture = focused_capture(&problem);
        let assets = AssetResolver::default();
        let mut events = keys("7651");
        events.insert(0, AppEvent::Tick);
        events.push(AppEvent::Key(key(KeyCode::Enter)));
        let mut presenter = presenter(events);

        let mut ctx = PresentContext {
            trial_index: 5,
            trial_count: 16,
            rejection: None,
            answer: Some(&mut capture),
            missing_images: &[],
            assets: &assets,
        };
        let response = presenter.present(&problem, &mut ctx).unwrap();

        assert_eq!(response, Response::Button(0));
        assert!(capture.finalize().is_correct);
    }

    #[test]
    fn presenter_ctrl_c_aborts() {
        let welcome = trial(1);
        let assets = AssetResolver::default();
        let mut presenter = presenter(vec![AppEvent::Key(ctrl('c'))]);
        let mut ctx = PresentContext {
            trial_index: 1,
            trial_count: 16,
            rejection: None,
            answer: None,
            missing_images: &[],
            assets: &assets,
        };
        assert!(matches!(
            presenter.present(&welcome, &mut ctx),
            Err(StudyError::Aborted)
        ));
    }

    #[test]
    fn presenter_keeps_answers_after_rejection() {
        let info = trial(2);
        let assets = AssetResolver::default();
        let mut events = keys("Ada");
        events.push(AppEvent::Key(key(KeyCode::Tab)));
        events.push(AppEvent::Paste("a@b.c".to_owned()));
        events.push(AppEvent::Key(key(KeyCode::Enter)));
        // Second presentation: only confirm again.
        events.push(AppEvent::Key(key(KeyCode::Enter)));
        let mut presenter = presenter(events);

        let mut ctx = PresentContext {
            trial_index: 2,
            trial_count: 16,
            rejection: None,
            answer: None,
            missing_images: &[],
            assets: &assets,
        };
        let first = presenter.present(&info, &mut ctx).unwrap();

        let rejection = study::engine::FormError {
            missing: vec!["email".to_owned()],
            ..Default::default()
        };
        let mut ctx = PresentContext {
            trial_index: 2,
            trial_count: 16,
            rejection: Some(&rejection),
            answer: None,
            missing_images: &[],
            assets: &assets,
        };
        let second = presenter.present(&info, &mut ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn presenter_surfaces_exhausted_events() {
        let welcome = trial(1);
        let assets = AssetResolver::default();
        let mut presenter = presenter(Vec::new());
        let mut ctx = PresentContext {
            trial_index: 1,
            trial_count: 16,
            rejection: None,
            answer: None,
            missing_images: &[],
            assets: &assets,
        };
        assert!(matches!(
            presenter.present(&welcome, &mut ctx),
            Err(StudyError::Presentation(_))
        ));
    }

    /// Test backend whose screen writes fail.
    struct BrokenScreen(TestBackend);

    impl Backend for BrokenScreen {
        fn draw<'a, I>(&mut self, _content: I) -> std::io::Result<()>
        where
            I: Iterator<Item = (u16, u16, &'a ratatui::buffer::Cell)>,
        {
            Err(std::io::Error::other("screen gone"))
        }

        fn hide_cursor(&mut self) -> std::io::Result<()> {
            self.0.hide_cursor()
        }

        fn show_cursor(&mut self) -> std::io::Result<()> {
            self.0.show_cursor()
        }

        fn get_cursor_position(&mut self) -> std::io::Result<ratatui::layout::Position> {
            self.0.get_cursor_position()
        }

        fn set_cursor_position<P: Into<ratatui::layout::Position>>(
            &mut self,
            position: P,
        ) -> std::io::Result<()> {
            self.0.set_cursor_position(position)
        }

        fn clear(&mut self) -> std::io::Result<()> {
            self.0.clear()
        }

        fn size(&self) -> std::io::Result<ratatui::layout::Size> {
            self.0.size()
        }

        fn window_size(&mut self) -> std::io::Result<ratatui::backend::WindowSize> {
            self.0.window_size()
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.0.flush()
        }
    }

    #[test]
    fn draw_failure_is_a_presentation_error() {
        let welcome = trial(1);
        let assets = AssetResolver::default();
        let terminal = Terminal::new(BrokenScreen(TestBackend::new(100, 40))).unwrap();
        let mut presenter = TuiPresenter::new(
            terminal,
            VecDeque::from(vec![AppEvent::Key(key(KeyCode::Enter))]),
            true,
        );
        let mut ctx = PresentContext {
            trial_index: 1,
            trial_count: 16,
            rejection: None,
            answer: None,
            missing_images: &[],
            assets: &assets,
        };
        let Err(StudyError::Presentation(message)) = presenter.present(&welcome, &mut ctx) else {
            panic!("expected a presentation error");
        };
        assert!(message.contains("screen gone"));
    }

    #[test]
    fn open_missing_image_reports_path() {
        let dir = std::env::temp_dir().join("study-tui-no-such-dir");
        let notice = open_image(&AssetResolver::new(&dir), "problem_9.png");
        assert!(notice.is_error);
        assert!(notice.text.starts_with("image not found:"));
        assert!(notice.text.contains("problem_9.png"));
    }
}
