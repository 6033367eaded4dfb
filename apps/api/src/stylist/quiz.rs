//! Self-check quiz. Picks a body type locally, without a model call.
//!
//! Each question has exactly one option per body type. The diagnosis is a
//! majority vote over the chosen options.

use serde::Serialize;
use thiserror::Error;

use crate::stylist::models::{BodyType, BodyTypeDiagnosis, DiagnosisSource};

#[derive(Debug, Clone, Serialize)]
pub struct QuizOption {
    pub label: &'static str,
    pub value: BodyType,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizQuestion {
    pub id: u32,
    pub question: &'static str,
    pub options: [QuizOption; 3],
}

pub static QUIZ_QUESTIONS: [QuizQuestion; 4] = [
    QuizQuestion {
        id: 1,
        question: "What is your neck like?",
        options: [
            QuizOption {
                label: "Rather short, thick and muscular",
                value: BodyType::Straight,
            },
            QuizOption {
                label: "Rather long, slim and delicate",
                value: BodyType::Wave,
            },
            QuizOption {
                label: "Rather long, with visible joints and tendons",
                value: BodyType::Natural,
            },
        ],
    },
    QuizQuestion {
        id: 2,
        question: "How do your collarbones look?",
        options: [
            QuizOption {
                label: "Barely visible",
                value: BodyType::Straight,
            },
            QuizOption {
                label: "Thin and clearly defined",
                value: BodyType::Wave,
            },
            QuizOption {
                label: "Thick and prominent",
                value: BodyType::Natural,
            },
        ],
    },
    QuizQuestion {
        id: 3,
        question: "What are your palms like?",
        options: [
            QuizOption {
                label: "Thick and springy, with slim wrists",
                value: BodyType::Straight,
            },
            QuizOption {
                label: "Thin and soft, with flat wrists",
                value: BodyType::Wave,
            },
            QuizOption {
                label: "Joints and bones stand out",
                value: BodyType::Natural,
            },
        ],
    },
    QuizQuestion {
        id: 4,
        question: "Where does your waist sit?",
        options: [
            QuizOption {
                label: "High, with a clear waistline",
                value: BodyType::Straight,
            },
            QuizOption {
                label: "Low, with a gentle curve",
                value: BodyType::Wave,
            },
            QuizOption {
                label: "Hip bones stick out to the sides",
                value: BodyType::Natural,
            },
        ],
    },
];

#[derive(Debug, Error, PartialEq)]
pub enum QuizError {
    #[error("at least one quiz answer is required")]
    NoAnswers,

    #[error("got {got} answers but the quiz has only {max} questions")]
    TooManyAnswers { got: usize, max: usize },
}

pub fn find_question(id: u32) -> Option<&'static QuizQuestion> {
    QUIZ_QUESTIONS.iter().find(|q| q.id == id)
}

/// Majority vote over `answers`. Ties go to the later type in `BodyType::ALL` order.
pub fn diagnose_from_answers(answers: &[BodyType]) -> Result<BodyTypeDiagnosis, QuizError> {
    if answers.is_empty() {
        return Err(QuizError::NoAnswers);
    }
    if answers.len() > QUIZ_QUESTIONS.len() {
        return Err(QuizError::TooManyAnswers {
            got: answers.len(),
            max: QUIZ_QUESTIONS.len(),
        });
    }

    let count = |t: BodyType| answers.iter().filter(|&&a| a == t).count();

    let (winner, votes) = BodyType::ALL
        .into_iter()
        .map(|t| (t, count(t)))
        .fold(None, |best: Option<(BodyType, usize)>, (t, n)| match best {
            Some((_, best_n)) if best_n > n => best,
            _ => Some((t, n)),
        })
        .unwrap_or((BodyType::Straight, 0));

    Ok(BodyTypeDiagnosis {
        body_type: winner,
        reason: format!(
            "{votes} of {} quiz answers matched the {winner} frame",
            answers.len()
        ),
        source: DiagnosisSource::Quiz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use BodyType::*;

    #[test]
    fn every_question_offers_each_type_once() {
        for question in &QUIZ_QUESTIONS {
            for body_type in BodyType::ALL {
                let n = question
                    .options
                    .iter()
                    .filter(|o| o.value == body_type)
                    .count();
                assert_eq!(n, 1, "question {} / {body_type}", question.id);
            }
        }
    }

    #[test]
    fn clear_majority_wins() {
        let diagnosis = diagnose_from_answers(&[Wave, Wave, Natural, Wave]).unwrap();
        assert_eq!(diagnosis.body_type, Wave);
        assert_eq!(diagnosis.source, DiagnosisSource::Quiz);
        assert!(diagnosis.reason.starts_with("3 of 4"));
    }

    #[test]
    fn tie_goes_to_later_type() {
        assert_eq!(
            diagnose_from_answers(&[Straight, Straight, Wave, Wave])
                .unwrap()
                .body_type,
            Wave
        );
        assert_eq!(
            diagnose_from_answers(&[Straight, Natural]).unwrap().body_type,
            Natural
        );
        assert_eq!(
            diagnose_from_answers(&[Wave, Natural, Straight]).unwrap().body_type,
            Natural
        );
    }

    #[test]
    fn earlier_type_with_more_votes_beats_later_type() {
        assert_eq!(
            diagnose_from_answers(&[Straight, Straight, Natural]).unwrap().body_type,
            Straight
        );
    }

    #[test]
    fn empty_answers_are_rejected() {
        assert_eq!(diagnose_from_answers(&[]), Err(QuizError::NoAnswers));
    }

    #[test]
    fn too_many_answers_are_rejected() {
        let err = diagnose_from_answers(&[Wave; 5]).unwrap_err();
        assert_eq!(err, QuizError::TooManyAnswers { got: 5, max: 4 });
    }

    #[test]
    fn find_question_by_id() {
        assert_eq!(find_question(2).unwrap().id, 2);
        assert!(find_question(9).is_none());
    }
}
