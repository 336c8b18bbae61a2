// THEORY:
// The runner doubles as a physics lesson. This module holds the small, fixed
// catalog of concepts the game talks about and the coach prompts that tie those
// concepts to what the player just did.
//
// `ConceptRotation` cycles the on-screen concept on the display clock. A quiz
// picks a concept at random; the presenter owns the overlay, the core only owns
// the catalog and the verdict.

use rand::Rng;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, PartialEq, Eq)]
pub struct Question {
    pub prompt: &'static str,
    pub choices: &'static [&'static str],
    /// Index into `choices`.
    pub answer: usize,
}

impl Question {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer
    }

    pub fn answer_text(&self) -> &'static str {
        self.choices.get(self.answer).copied().unwrap_or_default()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Concept {
    pub title: &'static str,
    pub text: &'static str,
    pub question: Question,
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Concept: {} - {}", self.title, self.text)
    }
}

pub static CONCEPTS: [Concept; 4] = [
    Concept {
        title: "Velocity",
        text: "Velocity = change in position over time. Faster side-steps increase px/s.",
        question: Question {
            prompt: "Which quantity describes change in position over time?",
            choices: &["Velocity", "Mass", "Temperature"],
            answer: 0,
        },
    },
    Concept {
        title: "Acceleration",
        text: "Acceleration is how quickly your speed changes when you switch direction.",
        question: Question {
            prompt: "Acceleration is best described as a change in what?",
            choices: &["Color", "Speed over time", "Obstacle size"],
            answer: 1,
        },
    },
    Concept {
        title: "Reaction Time",
        text: "Reaction time is delay between obstacle spawn and your first movement response.",
        question: Question {
            prompt: "In this game, reaction time measures the delay between obstacle spawn and your...",
            choices: &["First movement response", "Highest score", "Camera startup"],
            answer: 0,
        },
    },
    Concept {
        title: "Relative Motion",
        text: "You move horizontally while obstacles move vertically, creating relative trajectories.",
        question: Question {
            prompt: "Relative motion here comes from your horizontal movement compared to...",
            choices: &["Vertical obstacle movement", "Audio volume", "Button color"],
            answer: 0,
        },
    },
];

pub fn random_concept<R: Rng + ?Sized>(rng: &mut R) -> &'static Concept {
    &CONCEPTS[rng.gen_range(0..CONCEPTS.len())]
}

/// Shows one concept after another, advancing once per period.
#[derive(Debug, Clone)]
pub struct ConceptRotation {
    period: Duration,
    index: usize,
    shown_at: Instant,
}

impl ConceptRotation {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            index: 0,
            shown_at: now,
        }
    }

    pub fn current(&self) -> &'static Concept {
        &CONCEPTS[self.index % CONCEPTS.len()]
    }

    /// Returns the new concept when the period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<&'static Concept> {
        if self.period.is_zero() || now.saturating_duration_since(self.shown_at) < self.period {
            return None;
        }
        self.index = (self.index + 1) % CONCEPTS.len();
        self.shown_at = now;
        Some(self.current())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoachPrompt {
    Welcome,
    QuickReaction,
    Anticipate,
    GameOver,
    QuizCorrect(&'static str),
    QuizReview(&'static str),
}

impl CoachPrompt {
    pub fn for_reaction(reaction: Duration, quick: Duration) -> Self {
        if reaction < quick {
            CoachPrompt::QuickReaction
        } else {
            CoachPrompt::Anticipate
        }
    }

    pub fn for_quiz(concept: &Concept, correct: bool) -> Self {
        if correct {
            CoachPrompt::QuizCorrect(concept.title)
        } else {
            CoachPrompt::QuizReview(concept.title)
        }
    }
}

impl fmt::Display for CoachPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Coach: ")?;
        match self {
            CoachPrompt::Welcome => f.write_str("Start moving to unlock physics tips."),
            CoachPrompt::QuickReaction => f.write_str("Great reflexes! Low reaction times help avoid collisions."),
            CoachPrompt::Anticipate => f.write_str("Try anticipating obstacle patterns to reduce reaction time."),
            CoachPrompt::GameOver => {
                f.write_str("In physics terms, earlier acceleration gives you more time to clear each lane.")
            }
            CoachPrompt::QuizCorrect(title) => {
                write!(f, "Nice! You connected movement with {}.", title.to_lowercase())
            }
            CoachPrompt::QuizReview(title) => write!(f, "Review {} and try the next coin.", title.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn answers_index_their_choices() {
        for concept in &CONCEPTS {
            assert!(concept.question.answer < concept.question.choices.len());
            assert!(concept.question.is_correct(concept.question.answer));
        }
        assert_eq!(CONCEPTS[1].question.answer_text(), "Speed over time");
    }

    #[test]
    fn rotation_advances_once_per_period() {
        let start = Instant::now();
        let mut rotation = ConceptRotation::new(Duration::from_secs(8), start);
        assert_eq!(rotation.current().title, "Velocity");
        assert!(rotation.poll(start + Duration::from_secs(7)).is_none());
        assert_eq!(rotation.poll(start + Duration::from_secs(8)).map(|c| c.title), Some("Acceleration"));
        assert!(rotation.poll(start + Duration::from_secs(9)).is_none());

        let mut at = start + Duration::from_secs(8);
        for _ in 0..3 {
            at += Duration::from_secs(8);
            rotation.poll(at);
        }
        assert_eq!(rotation.current().title, "Velocity");
    }

    #[test]
    fn random_concept_comes_from_catalog() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let concept = random_concept(&mut rng);
            assert!(CONCEPTS.iter().any(|c| std::ptr::eq(c, concept)));
        }
    }

    #[test]
    fn prompts_render() {
        let quick = Duration::from_millis(450);
        assert_eq!(CoachPrompt::for_reaction(Duration::from_millis(449), quick), CoachPrompt::QuickReaction);
        assert_eq!(CoachPrompt::for_reaction(quick, quick), CoachPrompt::Anticipate);
        assert_eq!(
            CoachPrompt::for_quiz(&CONCEPTS[3], true).to_string(),
            "Coach: Nice! You connected movement with relative motion."
        );
        assert_eq!(
            CoachPrompt::for_quiz(&CONCEPTS[0], false).to_string(),
            "Coach: Review velocity and try the next coin."
        );
        assert_eq!(CoachPrompt::Welcome.to_string(), "Coach: Start moving to unlock physics tips.");
    }
}
