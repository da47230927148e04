//! Pure exam scoring.
//!
//! The score is computed locally from the fixed question sequence and the
//! captured answers; remote services never alter it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Answer, Question, QuestionId};

/// Minimum score (in percent) shown as a pass.
pub const PASSING_SCORE: u8 = 60;

/// Presentation band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Excellent,
    Good,
    Satisfactory,
    Sufficient,
    Failed,
}

impl Grade {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Excellent,
            80..=89 => Self::Good,
            70..=79 => Self::Satisfactory,
            s if s >= PASSING_SCORE => Self::Sufficient,
            _ => Self::Failed,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Satisfactory => "satisfactory",
            Self::Sufficient => "sufficient",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate outcome of a finished exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    #[serde(rename = "totalQuestions")]
    pub total: u32,
    #[serde(rename = "correctAnswers")]
    pub correct: u32,
    /// Questions not answered correctly, unanswered ones included.
    #[serde(rename = "wrongAnswers")]
    pub wrong: u32,
    pub unanswered: u32,
    /// Percentage of correct answers, rounded to the nearest integer.
    pub score: u8,
    /// Seconds used out of the time budget.
    pub time_spent: u32,
    /// Graded answers in question order.
    pub answers: Vec<Answer>,
}

impl ExamResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.score >= PASSING_SCORE
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        Grade::from_score(self.score)
    }
}

/// Score a set of answers against the session's questions.
///
/// Answers whose question id is not in `questions` are ignored; correctness is
/// re-derived from each question's correct label.
#[must_use]
pub fn score(
    questions: &[Question],
    answers: &HashMap<QuestionId, Answer>,
    duration_secs: u32,
    remaining_secs: u32,
) -> ExamResult {
    let mut graded = Vec::with_capacity(answers.len());
    let mut correct = 0_u32;

    for question in questions {
        if let Some(answer) = answers.get(&question.id()) {
            let answer = Answer::grade(question, answer.selected());
            if answer.is_correct() {
                correct = correct.saturating_add(1);
            }
            graded.push(answer);
        }
    }

    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    let answered = u32::try_from(graded.len()).unwrap_or(u32::MAX);

    ExamResult {
        total,
        correct,
        wrong: total.saturating_sub(correct),
        unanswered: total.saturating_sub(answered),
        score: percentage(correct, total),
        time_spent: duration_secs.saturating_sub(remaining_secs),
        answers: graded,
    }
}

/// `round(correct / total * 100)` with halves rounded up; `0` for an empty set.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let rounded = (correct * 200 + total) / (total * 2);
    u8::try_from(rounded).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, OptionLabel, QuestionDraft};

    fn question(id: u64, correct: OptionLabel) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            prompt: format!("Q{id}"),
            options: ["a".into(), "b".into(), "c".into(), "d".into()],
            category: "General".into(),
            difficulty: Difficulty::Medium,
            correct,
            explanation: None,
        }
        .validate()
        .unwrap()
    }

    fn answers(pairs: &[(&Question, OptionLabel)]) -> HashMap<QuestionId, Answer> {
        pairs
            .iter()
            .map(|(q, label)| (q.id(), Answer::grade(q, *label)))
            .collect()
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(percentage(6, 10), 60);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn unanswered_questions_count_as_wrong() {
        let qs: Vec<Question> = (1..=3).map(|i| question(i, OptionLabel::A)).collect();
        let a = answers(&[(&qs[0], OptionLabel::A)]);

        let result = score(&qs, &a, 600, 540);

        assert_eq!(result.total, 3);
        assert_eq!(result.correct, 1);
        assert_eq!(result.wrong, 2);
        assert_eq!(result.unanswered, 2);
        assert_eq!(result.score, 33);
        assert_eq!(result.time_spent, 60);
        assert!(!result.passed());
    }

    #[test]
    fn answers_follow_question_order_and_ignore_foreign_ids() {
        let qs: Vec<Question> = (1..=2).map(|i| question(i, OptionLabel::C)).collect();
        let stranger = question(99, OptionLabel::C);
        let a = answers(&[
            (&qs[1], OptionLabel::C),
            (&stranger, OptionLabel::C),
            (&qs[0], OptionLabel::D),
        ]);

        let result = score(&qs, &a, 60, 0);

        let ids: Vec<u64> = result.answers.iter().map(|a| a.question_id().value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(result.correct, 1);
        assert_eq!(result.time_spent, 60);
    }

    #[test]
    fn scoring_is_deterministic() {
        let qs: Vec<Question> = (1..=10).map(|i| question(i, OptionLabel::B)).collect();
        let picks: Vec<(&Question, OptionLabel)> = qs
            .iter()
            .enumerate()
            .map(|(i, q)| (q, if i < 6 { OptionLabel::B } else { OptionLabel::A }))
            .collect();
        let a = answers(&picks);

        let first = score(&qs, &a, 900, 300);
        let second = score(&qs, &a, 900, 300);
        assert_eq!(first, second);
        assert_eq!(first.score, 60);
        assert!(first.passed());
        assert_eq!(first.grade(), Grade::Sufficient);
    }

    #[test]
    fn grade_bands() {
        assert_eq!(Grade::from_score(100), Grade::Excellent);
        assert_eq!(Grade::from_score(85), Grade::Good);
        assert_eq!(Grade::from_score(70), Grade::Satisfactory);
        assert_eq!(Grade::from_score(59), Grade::Failed);
    }
}
