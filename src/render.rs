//! Transport-independent render instructions for every bot reply.

use crate::{
    catalog::Question,
    database::ScoreRecord,
    engine::{AnswerOutcome, Next, Verdict},
};

/// Prefix of the payload carried by category buttons.
pub const CATEGORY_PREFIX: &str = "category:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Send a standalone message.
    Send,
    /// Replace the content of the message the user interacted with.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One button per row.
    Column,
    /// Every button on a single row.
    Row,
}

/// A selectable option: what the user sees and what comes back when it's pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    pub text: String,
    pub choices: Vec<Choice>,
    pub layout: Layout,
    pub delivery: Delivery,
}

impl Render {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
            layout: Layout::Column,
            delivery: Delivery::Send,
        }
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn in_one_row(mut self) -> Self {
        self.layout = Layout::Row;
        self
    }

    pub fn replacing(mut self) -> Self {
        self.delivery = Delivery::Replace;
        self
    }
}

pub fn greeting() -> Render {
    Render::text("Welcome to the quiz bot! Type /cat to select a category.")
}

pub fn farewell() -> Render {
    Render::text("Thank you for playing! Type /cat to play again.")
}

pub fn categories<'a>(names: impl IntoIterator<Item = &'a str>) -> Render {
    let choices = names
        .into_iter()
        .map(|name| Choice {
            label: name.to_owned(),
            payload: format!("{CATEGORY_PREFIX}{name}"),
        })
        .collect();
    Render::text("Select a category:").with_choices(choices)
}

/// Prompt followed by lettered options. Each button carries the literal option text.
pub fn question(question: &Question) -> Render {
    let options = question
        .answer_options()
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}. {}", option_letter(i), option))
        .collect::<Vec<_>>()
        .join("\n");
    let choices = question
        .answer_options()
        .iter()
        .map(|option| Choice {
            label: option.clone(),
            payload: option.clone(),
        })
        .collect();

    Render::text(format!("{}\n\n{}", question.prompt(), options))
        .with_choices(choices)
        .in_one_row()
}

fn option_letter(i: usize) -> char {
    u8::try_from(i)
        .ok()
        .and_then(|i| b'A'.checked_add(i))
        .filter(u8::is_ascii_uppercase)
        .map_or('?', char::from)
}

pub fn verdict(first_name: &str, outcome: &AnswerOutcome) -> Render {
    let text = match outcome.verdict {
        Verdict::Correct => format!(
            "{first_name}, That's Correct! 🎉 Your score: {}",
            outcome.score
        ),
        Verdict::Incorrect => format!(
            "Sorry {first_name}, that's incorrect. 😞 Your score: {}",
            outcome.score
        ),
    };
    Render::text(text).replacing()
}

/// What follows the verdict: the next question or the end of the quiz.
pub fn next_step(next: &Next) -> Render {
    match next {
        Next::Question(next) => question(next),
        Next::Completed { final_score } => completed(*final_score),
    }
}

pub fn completed(final_score: u32) -> Render {
    Render::text(format!(
        "End of quiz! Your score: {final_score}\nType /cat to play again."
    ))
}

pub fn score(score: u32) -> Render {
    Render::text(format!("Your current score is: {score}"))
}

fn tier_marker(rank: usize) -> &'static str {
    match rank {
        1..=3 => "🥇",
        4..=6 => "🥈",
        _ => "🥉",
    }
}

pub fn chat_highscores(records: &[ScoreRecord]) -> Render {
    if records.is_empty() {
        return Render::text("No highscores for this chat yet.");
    }
    let mut text = String::from("Highscores for this chat:\n");
    for (idx, record) in records.iter().enumerate() {
        let rank = idx + 1;
        text.push_str(&format!("{rank}. {} {record}\n", tier_marker(rank)));
    }
    Render::text(text)
}

pub fn leaderboard(records: &[ScoreRecord]) -> Render {
    if records.is_empty() {
        return Render::text("No global highscores yet.");
    }
    let mut text = String::from("Global Leaderboard:\n");
    for (idx, record) in records.iter().enumerate() {
        text.push_str(&format!("{}. {record}\n", idx + 1));
    }
    Render::text(text)
}
