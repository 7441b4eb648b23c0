//! Aggregate analysis over session logs.
//!
//! Accuracy and response time over all problem records, broken down per
//! problem, per tool used, per experience level and per role. Participants
//! are identified by run id; a participant's survey answers apply to all of
//! their problem records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::catalog::{PROGRAMMING_EXPERIENCE, SOLIDITY_EXPERIENCE};
use crate::record::{ProblemResult, ResultRecord, SessionLog};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProblemStats {
    pub problem_number: usize,
    pub problem_name: String,
    pub correct: usize,
    pub total: usize,
    pub accuracy_pct: f64,
    pub mean_secs: f64,
    pub median_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    pub pct: f64,
}

/// Accuracy of all problem records of one group of participants.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupAccuracy {
    pub label: String,
    pub participants: usize,
    pub correct: usize,
    pub total: usize,
    pub accuracy_pct: f64,
    pub mean_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    pub total_responses: usize,
    pub participants: usize,
    pub correct: usize,
    pub accuracy_pct: f64,
    pub mean_secs: f64,
    pub median_secs: f64,
    pub per_problem: Vec<ProblemStats>,
    pub tool_usage: Vec<CategoryCount>,
    pub accuracy_by_tool: Vec<GroupAccuracy>,
    pub by_programming_experience: Vec<GroupAccuracy>,
    pub by_solidity_experience: Vec<GroupAccuracy>,
    pub roles: Vec<CategoryCount>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[allow(clippy::cast_precision_loss)]
fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Upper median: the element at `len / 2` of the sorted values.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.get(sorted.len() / 2).copied().unwrap_or(0.0)
}

#[allow(clippy::cast_precision_loss)]
fn secs(record: &ResultRecord) -> f64 {
    record.rt_ms as f64 / 1000.0
}

/// Counts sorted by count descending, then label.
fn ranked(counts: BTreeMap<String, usize>) -> Vec<CategoryCount> {
    let total: usize = counts.values().sum();
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            pct: pct(count, total),
            label,
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    out
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

impl Analysis {
    #[must_use]
    pub fn from_logs(logs: &[SessionLog]) -> Self {
        let problems: Vec<(&SessionLog, &ResultRecord, &ProblemResult)> = logs
            .iter()
            .flat_map(|log| log.problems().map(move |(r, p)| (log, r, p)))
            .collect();

        let participants: BTreeSet<&str> = problems
            .iter()
            .map(|(log, _, _)| log.header.run_id.as_str())
            .collect();
        let correct = problems.iter().filter(|(_, _, p)| p.is_correct).count();
        let times: Vec<f64> = problems.iter().map(|(_, r, _)| secs(r)).collect();

        // Per problem, ordered by (number, name).
        let mut grouped: BTreeMap<(usize, &str), Vec<(&ResultRecord, &ProblemResult)>> =
            BTreeMap::new();
        for &(_, r, p) in &problems {
            grouped
                .entry((p.problem_number, p.problem_name.as_str()))
                .or_default()
                .push((r, p));
        }
        let per_problem = grouped
            .into_iter()
            .map(|((number, name), rows)| {
                let ok = rows.iter().filter(|(_, p)| p.is_correct).count();
                let t: Vec<f64> = rows.iter().map(|(r, _)| secs(r)).collect();
                ProblemStats {
                    problem_number: number,
                    problem_name: name.to_owned(),
                    correct: ok,
                    total: rows.len(),
                    accuracy_pct: pct(ok, rows.len()),
                    mean_secs: mean(&t),
                    median_secs: median(&t),
                }
            })
            .collect();

        let tool_usage = ranked(count_answers(logs, "tools_used"));
        let accuracy_by_tool = tool_usage
            .iter()
            .map(|c| group_accuracy(logs, "tools_used", &c.label))
            .filter(|g| g.total > 0)
            .collect();

        let by_level = |field: &str, levels: &[&str]| -> Vec<GroupAccuracy> {
            levels
                .iter()
                .map(|level| group_accuracy(logs, field, level))
                .filter(|g| g.participants > 0 && g.total > 0)
                .collect()
        };

        Self {
            total_responses: problems.len(),
            participants: participants.len(),
            correct,
            accuracy_pct: pct(correct, problems.len()),
            mean_secs: mean(&times),
            median_secs: median(&times),
            per_problem,
            accuracy_by_tool,
            by_programming_experience: by_level("programming_exp", &PROGRAMMING_EXPERIENCE),
            by_solidity_experience: by_level("solidity_exp", &SOLIDITY_EXPERIENCE),
            roles: ranked(count_answers(logs, "role")),
            tool_usage,
        }
    }
}

/// How many sessions gave each answer to form field `field`.
fn count_answers(logs: &[SessionLog], field: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in logs.iter().filter_map(|log| log.form_value(field)) {
        *counts.entry(value.to_owned()).or_insert(0) += 1;
    }
    counts
}

fn group_accuracy(logs: &[SessionLog], field: &str, label: &str) -> GroupAccuracy {
    let members: Vec<&SessionLog> = logs
        .iter()
        .filter(|log| log.form_value(field) == Some(label))
        .collect();
    let rows: Vec<(&ResultRecord, &ProblemResult)> =
        members.iter().copied().flat_map(SessionLog::problems).collect();
    let ok = rows.iter().filter(|(_, p)| p.is_correct).count();
    let t: Vec<f64> = rows.iter().map(|(r, _)| secs(r)).collect();
    GroupAccuracy {
        label: label.to_owned(),
        participants: members.len(),
        correct: ok,
        total: rows.len(),
        accuracy_pct: pct(ok, rows.len()),
        mean_secs: mean(&t),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ParticipantAnswer;
    use crate::catalog::Complexity;
    use crate::engine::form;
    use crate::record::SessionHeader;

    fn session(run_id: &str, answers: &[(usize, bool, u64)], survey: &[(&str, &str)]) -> SessionLog {
        let mut log = SessionLog::new(SessionHeader {
            run_id: run_id.to_owned(),
            started_at_unix: 0,
            study_title: "t".to_owned(),
            timeline_fingerprint: String::new(),
            completed: true,
        });
        let mut demo = ResultRecord::new(3, "survey-multi-choice");
        demo.response = Some(form(survey.iter().copied()));
        log.push(demo);
        for (i, &(number, ok, rt_ms)) in answers.iter().enumerate() {
            let mut r = ResultRecord::new(5 + i, "html-button-response");
            r.rt_ms = rt_ms;
            r.problem = Some(ProblemResult {
                task: "problem".to_owned(),
                problem_name: format!("P{number}"),
                problem_number: number,
                complexity: Complexity::Low,
                correct_answer: 1,
                participant_answer: ParticipantAnswer::Integer(if ok { 1 } else { 0 }),
                is_correct: ok,
            });
            log.push(r);
        }
        log
    }

    fn sample() -> Vec<SessionLog> {
        vec![
            session(
                "a",
                &[(1, true, 10_000), (2, false, 20_000)],
                &[
                    ("programming_exp", "3-5 years"),
                    ("solidity_exp", "None"),
                    ("role", "Researcher"),
                    ("tools_used", "Calculator"),
                ],
            ),
            session(
                "b",
                &[(1, true, 30_000), (2, true, 40_000)],
                &[
                    ("programming_exp", "3-5 years"),
                    ("solidity_exp", "Beginner (read some code)"),
                    ("role", "Graduate Student"),
                    ("tools_used", "Calculator"),
                ],
            ),
            session(
                "c",
                &[(1, false, 50_000), (2, false, 60_000)],
                &[
                    ("programming_exp", "Less than 1 year"),
                    ("solidity_exp", "None"),
                    ("role", "Researcher"),
                    ("tools_used", "Pen and paper"),
                ],
            ),
        ]
    }

    #[test]
    fn overall_numbers() {
        let a = Analysis::from_logs(&sample());
        assert_eq!(a.total_responses, 6);
        assert_eq!(a.participants, 3);
        assert_eq!(a.correct, 3);
        assert!((a.accuracy_pct - 50.0).abs() < 1e-9);
        assert!((a.mean_secs - 35.0).abs() < 1e-9);
        // Sorted: 10,20,30,40,50,60 -> index 3.
        assert!((a.median_secs - 40.0).abs() < 1e-9);
    }

    #[test]
    fn per_problem_ordered_by_number() {
        let a = Analysis::from_logs(&sample());
        assert_eq!(a.per_problem.len(), 2);
        assert_eq!(a.per_problem[0].problem_number, 1);
        assert_eq!(a.per_problem[0].correct, 2);
        assert_eq!(a.per_problem[0].total, 3);
        assert!((a.per_problem[1].median_secs - 40.0).abs() < 1e-9);
    }

    #[test]
    fn tools_ranked_by_count() {
        let a = Analysis::from_logs(&sample());
        assert_eq!(a.tool_usage[0].label, "Calculator");
        assert_eq!(a.tool_usage[0].count, 2);
        assert_eq!(a.tool_usage[1].label, "Pen and paper");
        let calc = &a.accuracy_by_tool[0];
        assert_eq!(calc.participants, 2);
        assert_eq!(calc.correct, 3);
        assert_eq!(calc.total, 4);
    }

    #[test]
    fn experience_in_option_order() {
        let a = Analysis::from_logs(&sample());
        let labels: Vec<&str> = a
            .by_programming_experience
            .iter()
            .map(|g| g.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Less than 1 year", "3-5 years"]);
        let solidity: Vec<&str> = a
            .by_solidity_experience
            .iter()
            .map(|g| g.label.as_str())
            .collect();
        assert_eq!(solidity, vec!["None", "Beginner (read some code)"]);
    }

    #[test]
    fn roles_counted_per_session() {
        let a = Analysis::from_logs(&sample());
        assert_eq!(a.roles[0].label, "Researcher");
        assert_eq!(a.roles[0].count, 2);
    }

    #[test]
    fn empty_input() {
        let a = Analysis::from_logs(&[]);
        assert_eq!(a.total_responses, 0);
        assert!(a.accuracy_pct.abs() < f64::EPSILON);
        assert!(a.per_problem.is_empty());
        assert!(a.tool_usage.is_empty());
    }
}
