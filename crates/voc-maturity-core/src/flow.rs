//! The screen state machine that walks a user through an assessment.
//!
//! A [`Session`] owns one user's progress: the active [`Screen`], the
//! [`AnswerSet`], the captured email and, once computed, the [`Outcome`].
//! The questionnaire itself is shared read-only through an `Arc`, so any
//! number of sessions can run side by side without sharing mutable state.
//!
//! ```text
//! Welcome ─Start─▶ Instructions ─Begin─▶ Question(1) ─SelectOption/Next─▶ … ─▶ Question(n)
//!                                          ▲      │Back (floored at 1)              │ SelectOption/Next
//!                                          └──────┘                                 ▼
//!                          ShareEmail ◀─ShareViaEmail─ ShareMenu ◀─Share─ Result ◀─Compute─ ReadyToScore
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FlowError;
use crate::model::{AnswerSet, Question, Questionnaire};
use crate::report::AssessmentReport;
use crate::scoring::{score_answers, Outcome};
use crate::traits::{FlowObserver, NoopObserver};

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Welcome,
    Instructions,
    /// Zero-based index of the active question.
    Question {
        index: usize,
    },
    ReadyToScore,
    Result,
    ShareMenu,
    ShareEmail,
}

impl Screen {
    /// Whether an outcome exists on this screen.
    pub fn is_scored(&self) -> bool {
        matches!(self, Screen::Result | Screen::ShareMenu | Screen::ShareEmail)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::Welcome => write!(f, "welcome"),
            Screen::Instructions => write!(f, "instructions"),
            Screen::Question { index } => write!(f, "question {}", index + 1),
            Screen::ReadyToScore => write!(f, "ready-to-score"),
            Screen::Result => write!(f, "result"),
            Screen::ShareMenu => write!(f, "share menu"),
            Screen::ShareEmail => write!(f, "share-by-email"),
        }
    }
}

/// A discrete user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Capture the email typed on the welcome screen.
    SetEmail(String),
    Start,
    Begin,
    /// Answer the active question with the option of this ID and advance.
    SelectOption(String),
    Next,
    Back,
    Compute,
    Share,
    ShareViaEmail,
    /// Confirm one recipient address on the share-by-email screen.
    AddRecipient(String),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetEmail(_) => "set-email",
            Action::Start => "start",
            Action::Begin => "begin",
            Action::SelectOption(_) => "select-option",
            Action::Next => "next",
            Action::Back => "back",
            Action::Compute => "compute",
            Action::Share => "share",
            Action::ShareViaEmail => "share-via-email",
            Action::AddRecipient(_) => "add-recipient",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScoredStage {
    Result,
    ShareMenu,
    ShareEmail,
}

#[derive(Debug, Clone)]
enum State {
    Welcome,
    Instructions,
    Question { index: usize },
    ReadyToScore,
    Scored { outcome: Outcome, stage: ScoredStage },
}

/// What the presentation layer needs to draw the active screen.
#[derive(Debug, Clone, Copy)]
pub enum ScreenView<'a> {
    Welcome {
        title: &'a str,
        description: &'a str,
        email: &'a str,
    },
    Instructions {
        question_count: usize,
        lines: &'a [String],
    },
    Question {
        /// 1-based question number.
        number: usize,
        total: usize,
        question: &'a Question,
        /// Scoring key already recorded for this question, if any.
        selected: Option<&'a str>,
        can_go_back: bool,
    },
    ReadyToScore {
        answered: usize,
        total: usize,
    },
    Result {
        outcome: &'a Outcome,
    },
    ShareMenu {
        outcome: &'a Outcome,
    },
    ShareEmail {
        outcome: &'a Outcome,
        recipients: &'a [String],
    },
}

/// One user's pass through a questionnaire.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    questionnaire: Arc<Questionnaire>,
    state: State,
    answers: AnswerSet,
    email: String,
    recipients: Vec<String>,
}

impl Session {
    pub fn new(questionnaire: Arc<Questionnaire>) -> Self {
        let answers = AnswerSet::new(questionnaire.question_count());
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            questionnaire,
            state: State::Welcome,
            answers,
            email: String::new(),
            recipients: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    pub fn screen(&self) -> Screen {
        match &self.state {
            State::Welcome => Screen::Welcome,
            State::Instructions => Screen::Instructions,
            State::Question { index } => Screen::Question { index: *index },
            State::ReadyToScore => Screen::ReadyToScore,
            State::Scored { stage, .. } => match stage {
                ScoredStage::Result => Screen::Result,
                ScoredStage::ShareMenu => Screen::ShareMenu,
                ScoredStage::ShareEmail => Screen::ShareEmail,
            },
        }
    }

    /// The computed outcome. Present exactly on the result and share screens.
    pub fn outcome(&self) -> Option<&Outcome> {
        match &self.state {
            State::Scored { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// Apply an action without observing it.
    pub fn apply(&mut self, action: Action) -> Result<Screen, FlowError> {
        self.apply_with(action, &NoopObserver)
    }

    /// Apply an action, reporting the transition to `observer`.
    ///
    /// On error the session is left unchanged.
    pub fn apply_with(
        &mut self,
        action: Action,
        observer: &dyn FlowObserver,
    ) -> Result<Screen, FlowError> {
        let from = self.screen();

        match (from, action) {
            (Screen::Welcome, Action::SetEmail(email)) => {
                self.email = email.trim().to_string();
            }
            (Screen::Welcome, Action::Start) => {
                if self.questionnaire.policy.require_email && self.email.is_empty() {
                    return Err(FlowError::EmailRequired);
                }
                self.state = State::Instructions;
            }
            (Screen::Instructions, Action::Begin) => {
                self.state = if self.questionnaire.question_count() == 0 {
                    State::ReadyToScore
                } else {
                    State::Question { index: 0 }
                };
            }
            (Screen::Question { index }, Action::SelectOption(option_id)) => {
                let question = &self.questionnaire.questions[index];
                let option =
                    question
                        .option(&option_id)
                        .ok_or_else(|| FlowError::UnknownOption {
                            number: index + 1,
                            option_id: option_id.clone(),
                        })?;
                self.answers.record(index, option.scoring_key());
                tracing::debug!(
                    session = %self.id,
                    question = index + 1,
                    option = %option_id,
                    "answer recorded"
                );
                self.advance_from(index);
            }
            (Screen::Question { index }, Action::Next) => self.advance_from(index),
            (Screen::Question { index }, Action::Back) => {
                self.state = State::Question {
                    index: index.saturating_sub(1),
                };
            }
            (Screen::ReadyToScore, Action::Compute) => {
                if self.questionnaire.policy.require_complete && !self.answers.is_complete() {
                    return Err(FlowError::IncompleteAnswers {
                        missing: self.answers.missing(),
                    });
                }
                let outcome = score_answers(&self.questionnaire, &self.answers);
                observer.on_scored(&outcome);
                self.state = State::Scored {
                    outcome,
                    stage: ScoredStage::Result,
                };
            }
            (Screen::Result, Action::Share) => self.set_stage(ScoredStage::ShareMenu),
            (Screen::ShareMenu, Action::ShareViaEmail) => self.set_stage(ScoredStage::ShareEmail),
            (Screen::ShareEmail, Action::AddRecipient(address)) => {
                let address = address.trim();
                if !address.is_empty() && !self.recipients.iter().any(|r| r == address) {
                    self.recipients.push(address.to_string());
                }
            }
            (screen, action) => {
                return Err(FlowError::InvalidAction {
                    action: action.name(),
                    screen,
                });
            }
        }

        let to = self.screen();
        if to != from {
            tracing::debug!(session = %self.id, %from, %to, "screen transition");
            observer.on_transition(from, to);
        }
        Ok(to)
    }

    /// Restart from the welcome screen with every answer cleared.
    ///
    /// The questionnaire is kept; everything else, the session ID included,
    /// starts fresh.
    pub fn reset(&mut self) {
        tracing::debug!(session = %self.id, "session reset");
        self.id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.state = State::Welcome;
        self.answers.clear();
        self.email.clear();
        self.recipients.clear();
    }

    /// Read-only view of the active screen.
    pub fn view(&self) -> ScreenView<'_> {
        let total = self.questionnaire.question_count();
        match &self.state {
            State::Welcome => ScreenView::Welcome {
                title: &self.questionnaire.title,
                description: &self.questionnaire.description,
                email: &self.email,
            },
            State::Instructions => ScreenView::Instructions {
                question_count: total,
                lines: &self.questionnaire.instructions,
            },
            State::Question { index } => ScreenView::Question {
                number: index + 1,
                total,
                question: &self.questionnaire.questions[*index],
                selected: self.answers.get(*index),
                can_go_back: *index > 0,
            },
            State::ReadyToScore => ScreenView::ReadyToScore {
                answered: self.answers.answered_count(),
                total,
            },
            State::Scored { outcome, stage } => match stage {
                ScoredStage::Result => ScreenView::Result { outcome },
                ScoredStage::ShareMenu => ScreenView::ShareMenu { outcome },
                ScoredStage::ShareEmail => ScreenView::ShareEmail {
                    outcome,
                    recipients: &self.recipients,
                },
            },
        }
    }

    /// Downloadable record of the session, once scored.
    pub fn report(&self) -> Option<AssessmentReport> {
        let outcome = self.outcome()?;
        Some(AssessmentReport::new(
            self.id,
            &self.questionnaire,
            &self.email,
            &self.answers,
            outcome,
        ))
    }

    fn advance_from(&mut self, index: usize) {
        let next = index + 1;
        self.state = if next < self.questionnaire.question_count() {
            State::Question { index: next }
        } else {
            State::ReadyToScore
        };
    }

    fn set_stage(&mut self, next: ScoredStage) {
        if let State::Scored { stage, .. } = &mut self.state {
            *stage = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::{AnswerOption, FlowPolicy, ResultTier, TierRange};
    use crate::scoring::ScoreTable;

    fn questionnaire(n: usize, policy: FlowPolicy) -> Arc<Questionnaire> {
        let options: Vec<AnswerOption> = [("yes", "Có"), ("unsure", "Không rõ"), ("no", "Không")]
            .iter()
            .map(|(key, text)| AnswerOption {
                id: (*key).into(),
                key: Some((*key).into()),
                text: (*text).into(),
            })
            .collect();
        let tier = |low: f64, high: f64, level: &str| ResultTier {
            range: TierRange::new(low, high),
            level: level.into(),
            name: format!("Level {level}"),
            icon: String::new(),
            description: String::new(),
        };
        Arc::new(Questionnaire {
            id: "voc".into(),
            title: "Voice of the Customer".into(),
            description: String::new(),
            instructions: vec![],
            questions: (1..=n)
                .map(|i| Question {
                    id: format!("q{i}"),
                    title: format!("Question {i}"),
                    options: options.clone(),
                })
                .collect(),
            tiers: vec![
                tier(0.0, 2.0, "1"),
                tier(2.0, 5.0, "2"),
                tier(5.0, 8.0, "3"),
                tier(8.0, n as f64 + 0.5, "4"),
            ],
            weights: ScoreTable::default(),
            policy,
        })
    }

    fn session(n: usize) -> Session {
        Session::new(questionnaire(n, FlowPolicy::default()))
    }

    fn at_first_question(n: usize) -> Session {
        let mut s = session(n);
        s.apply(Action::Start).unwrap();
        s.apply(Action::Begin).unwrap();
        s
    }

    fn answer_all(s: &mut Session, option_id: &str) {
        while let Screen::Question { .. } = s.screen() {
            s.apply(Action::SelectOption(option_id.into())).unwrap();
        }
    }

    #[derive(Default)]
    struct Recorder {
        transitions: Mutex<Vec<(Screen, Screen)>>,
        scored: Mutex<Vec<f64>>,
    }

    impl FlowObserver for Recorder {
        fn on_transition(&self, from: Screen, to: Screen) {
            self.transitions.lock().unwrap().push((from, to));
        }

        fn on_scored(&self, outcome: &Outcome) {
            self.scored.lock().unwrap().push(outcome.score);
        }
    }

    #[test]
    fn starts_on_welcome_without_outcome() {
        let s = session(3);
        assert_eq!(s.screen(), Screen::Welcome);
        assert!(s.outcome().is_none());
        assert_eq!(s.answers().len(), 3);
        assert!(s.report().is_none());
    }

    #[test]
    fn walks_the_full_flow() {
        let mut s = session(10);
        s.apply(Action::SetEmail("  cx@example.com ".into())).unwrap();
        assert_eq!(s.email(), "cx@example.com");
        assert_eq!(s.apply(Action::Start).unwrap(), Screen::Instructions);
        assert_eq!(s.apply(Action::Begin).unwrap(), Screen::Question { index: 0 });

        answer_all(&mut s, "yes");
        assert_eq!(s.screen(), Screen::ReadyToScore);
        assert!(s.outcome().is_none());

        assert_eq!(s.apply(Action::Compute).unwrap(), Screen::Result);
        let outcome = s.outcome().unwrap();
        assert_eq!(outcome.score, 10.0);
        assert_eq!(outcome.tier.as_ref().unwrap().level, "4");

        assert_eq!(s.apply(Action::Share).unwrap(), Screen::ShareMenu);
        assert_eq!(s.apply(Action::ShareViaEmail).unwrap(), Screen::ShareEmail);
        assert_eq!(s.outcome().unwrap().score, 10.0);
    }

    #[test]
    fn outcome_exists_only_on_scored_screens() {
        let mut s = session(2);
        let actions = [
            Action::Start,
            Action::Begin,
            Action::Next,
            Action::Next,
            Action::Compute,
            Action::Share,
            Action::ShareViaEmail,
        ];
        for action in actions {
            let screen = s.apply(action).unwrap();
            assert_eq!(s.outcome().is_some(), screen.is_scored(), "on {screen}");
        }
    }

    #[test]
    fn back_is_floored_at_first_question() {
        let mut s = at_first_question(5);
        assert_eq!(s.apply(Action::Back).unwrap(), Screen::Question { index: 0 });

        s.apply(Action::Next).unwrap();
        s.apply(Action::Next).unwrap();
        assert_eq!(s.apply(Action::Back).unwrap(), Screen::Question { index: 1 });
    }

    #[test]
    fn next_from_last_question_leaves_question_phase() {
        let mut s = at_first_question(3);
        s.apply(Action::Next).unwrap();
        assert_eq!(s.apply(Action::Next).unwrap(), Screen::Question { index: 2 });
        assert_eq!(s.apply(Action::Next).unwrap(), Screen::ReadyToScore);
        assert_eq!(s.answers().answered_count(), 0);
    }

    #[test]
    fn select_writes_the_active_slot() {
        let mut s = at_first_question(4);
        s.apply(Action::Next).unwrap();
        s.apply(Action::Next).unwrap();
        s.apply(Action::SelectOption("unsure".into())).unwrap();

        assert_eq!(s.answers().get(2), Some("unsure"));
        assert_eq!(s.answers().answered_count(), 1);
        assert_eq!(s.screen(), Screen::Question { index: 3 });

        s.apply(Action::Back).unwrap();
        match s.view() {
            ScreenView::Question {
                number, selected, ..
            } => {
                assert_eq!(number, 3);
                assert_eq!(selected, Some("unsure"));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn reanswering_overwrites_the_slot() {
        let mut s = at_first_question(2);
        s.apply(Action::SelectOption("no".into())).unwrap();
        s.apply(Action::Back).unwrap();
        s.apply(Action::SelectOption("yes".into())).unwrap();
        assert_eq!(s.answers().get(0), Some("yes"));
        assert_eq!(s.answers().answered_count(), 1);
    }

    #[test]
    fn unknown_option_is_rejected_without_moving() {
        let mut s = at_first_question(3);
        let err = s.apply(Action::SelectOption("maybe".into())).unwrap_err();
        assert_eq!(
            err,
            FlowError::UnknownOption {
                number: 1,
                option_id: "maybe".into()
            }
        );
        assert_eq!(s.screen(), Screen::Question { index: 0 });
        assert_eq!(s.answers().answered_count(), 0);
    }

    #[test]
    fn unanswered_questions_still_score() {
        let mut s = at_first_question(10);
        s.apply(Action::Next).unwrap();
        s.apply(Action::SelectOption("yes".into())).unwrap();
        s.apply(Action::SelectOption("unsure".into())).unwrap();
        answer_all(&mut s, "no");
        s.apply(Action::Compute).unwrap();

        let outcome = s.outcome().unwrap();
        assert_eq!(outcome.score, 1.5);
        assert_eq!(outcome.tier.as_ref().unwrap().level, "1");
    }

    #[test]
    fn actions_outside_their_screen_are_rejected() {
        let mut s = session(2);
        let err = s.apply(Action::Compute).unwrap_err();
        assert_eq!(
            err,
            FlowError::InvalidAction {
                action: "compute",
                screen: Screen::Welcome
            }
        );
        assert_eq!(s.screen(), Screen::Welcome);

        s.apply(Action::Start).unwrap();
        assert!(s.apply(Action::SetEmail("late@example.com".into())).is_err());
        assert!(s.apply(Action::Next).is_err());
    }

    #[test]
    fn compute_happens_once() {
        let mut s = at_first_question(1);
        s.apply(Action::Next).unwrap();
        s.apply(Action::Compute).unwrap();
        assert!(matches!(
            s.apply(Action::Compute),
            Err(FlowError::InvalidAction { .. })
        ));
    }

    #[test]
    fn share_screens_have_no_cancel() {
        let mut s = at_first_question(1);
        s.apply(Action::Next).unwrap();
        s.apply(Action::Compute).unwrap();
        s.apply(Action::Share).unwrap();
        assert!(s.apply(Action::Back).is_err());
        s.apply(Action::ShareViaEmail).unwrap();
        assert!(s.apply(Action::Back).is_err());
        assert_eq!(s.screen(), Screen::ShareEmail);
    }

    #[test]
    fn recipients_are_trimmed_and_deduplicated() {
        let mut s = at_first_question(1);
        s.apply(Action::Next).unwrap();
        s.apply(Action::Compute).unwrap();
        s.apply(Action::Share).unwrap();
        s.apply(Action::ShareViaEmail).unwrap();

        for address in ["a@example.com", " ", "b@example.com ", "a@example.com"] {
            s.apply(Action::AddRecipient(address.into())).unwrap();
        }
        assert_eq!(s.recipients(), ["a@example.com", "b@example.com"]);
        match s.view() {
            ScreenView::ShareEmail { recipients, .. } => assert_eq!(recipients.len(), 2),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn email_policy_blocks_blank_start() {
        let policy = FlowPolicy {
            require_email: true,
            ..FlowPolicy::default()
        };
        let mut s = Session::new(questionnaire(2, policy));
        assert_eq!(s.apply(Action::Start), Err(FlowError::EmailRequired));
        s.apply(Action::SetEmail("   ".into())).unwrap();
        assert_eq!(s.apply(Action::Start), Err(FlowError::EmailRequired));
        s.apply(Action::SetEmail("cx@example.com".into())).unwrap();
        assert_eq!(s.apply(Action::Start).unwrap(), Screen::Instructions);
    }

    #[test]
    fn completeness_policy_blocks_partial_compute() {
        let policy = FlowPolicy {
            require_complete: true,
            ..FlowPolicy::default()
        };
        let mut s = Session::new(questionnaire(3, policy));
        s.apply(Action::Start).unwrap();
        s.apply(Action::Begin).unwrap();
        s.apply(Action::SelectOption("yes".into())).unwrap();
        s.apply(Action::Next).unwrap();
        s.apply(Action::Next).unwrap();

        assert_eq!(
            s.apply(Action::Compute),
            Err(FlowError::IncompleteAnswers {
                missing: vec![2, 3]
            })
        );
        assert_eq!(s.screen(), Screen::ReadyToScore);
    }

    #[test]
    fn observer_sees_transitions_and_scoring() {
        let recorder = Recorder::default();
        let mut s = session(1);
        s.apply_with(Action::SetEmail("x@example.com".into()), &recorder)
            .unwrap();
        s.apply_with(Action::Start, &recorder).unwrap();
        s.apply_with(Action::Begin, &recorder).unwrap();
        s.apply_with(Action::SelectOption("yes".into()), &recorder)
            .unwrap();
        s.apply_with(Action::Compute, &recorder).unwrap();

        let transitions = recorder.transitions.lock().unwrap();
        assert_eq!(
            *transitions,
            vec![
                (Screen::Welcome, Screen::Instructions),
                (Screen::Instructions, Screen::Question { index: 0 }),
                (Screen::Question { index: 0 }, Screen::ReadyToScore),
                (Screen::ReadyToScore, Screen::Result),
            ]
        );
        assert_eq!(*recorder.scored.lock().unwrap(), vec![1.0]);
    }

    #[test]
    fn reset_returns_to_a_fresh_welcome() {
        let mut s = at_first_question(2);
        let first_id = s.id();
        answer_all(&mut s, "yes");
        s.apply(Action::Compute).unwrap();

        s.reset();
        assert_ne!(s.id(), first_id);
        assert_eq!(s.screen(), Screen::Welcome);
        assert!(s.outcome().is_none());
        assert_eq!(s.answers().answered_count(), 0);
        assert_eq!(s.answers().len(), 2);
    }

    #[test]
    fn sessions_share_questionnaire_not_state() {
        let q = questionnaire(2, FlowPolicy::default());
        let mut a = Session::new(Arc::clone(&q));
        let b = Session::new(Arc::clone(&q));
        a.apply(Action::Start).unwrap();
        assert_eq!(a.screen(), Screen::Instructions);
        assert_eq!(b.screen(), Screen::Welcome);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn instructions_view_carries_guidance() {
        let mut q = (*questionnaire(4, FlowPolicy::default())).clone();
        q.instructions = vec!["Pick one answer per question.".into()];
        let mut s = Session::new(Arc::new(q));
        s.apply(Action::Start).unwrap();
        match s.view() {
            ScreenView::Instructions {
                question_count,
                lines,
            } => {
                assert_eq!(question_count, 4);
                assert_eq!(lines, ["Pick one answer per question."]);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn ready_view_counts_answers() {
        let mut s = at_first_question(3);
        s.apply(Action::SelectOption("no".into())).unwrap();
        s.apply(Action::Next).unwrap();
        s.apply(Action::Next).unwrap();
        match s.view() {
            ScreenView::ReadyToScore { answered, total } => {
                assert_eq!(answered, 1);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }
}
