use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::instrument;

use crate::{error::LoadError, render::CATEGORY_PREFIX};

/// Telegram rejects button callback data longer than this.
pub const MAX_PAYLOAD_BYTES: usize = 64;

/// A single multiple choice question. `correct_answer` matches one of the
/// options verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    prompt: String,
    answer_options: Vec<String>,
    correct_answer: String,
}

impl Question {
    pub fn new(
        prompt: impl Into<String>,
        answer_options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            answer_options,
            correct_answer: correct_answer.into(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn answer_options(&self) -> &[String] {
        &self.answer_options
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn is_correct(&self, selected: &str) -> bool {
        self.correct_answer == selected
    }

    fn validate(&self) -> Result<(), &'static str> {
        if self.answer_options.is_empty() {
            return Err("no answer options");
        }
        if !self.answer_options.contains(&self.correct_answer) {
            return Err("correct answer is not one of the options");
        }
        // Options travel back as their own button payload.
        for option in &self.answer_options {
            if option.len() > MAX_PAYLOAD_BYTES {
                return Err("answer option is longer than 64 bytes");
            }
            if option.starts_with(CATEGORY_PREFIX) {
                return Err("answer option starts with the category button prefix");
            }
        }
        Ok(())
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError {
    let path = path.to_path_buf();
    move |source| LoadError::Io { path, source }
}

/// Read-only mapping from category name to its ordered questions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: BTreeMap<String, Vec<Question>>,
}

impl Catalog {
    /// Loads every `<name>.json` file in `dir` as the category `<name>`.
    /// Any unreadable or invalid file fails the whole load.
    #[instrument(level = "info")]
    pub fn load(dir: &Path) -> Result<Self, LoadError> {
        let mut catalog = Catalog::default();
        for entry in fs::read_dir(dir).map_err(io_err(dir))? {
            let path = entry.map_err(io_err(dir))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path).map_err(io_err(&path))?;
            let questions: Vec<Question> =
                serde_json::from_str(&content).map_err(|source| LoadError::Malformed {
                    path: path.clone(),
                    source,
                })?;

            tracing::debug!("Loaded {} questions for category '{}'", questions.len(), name);
            catalog.insert(name.to_owned(), questions)?;
        }

        if catalog.is_empty() {
            return Err(LoadError::EmptyCatalog(PathBuf::from(dir)));
        }
        tracing::info!("Loaded {} categories", catalog.categories.len());
        Ok(catalog)
    }

    /// Builds a catalog from already parsed content, applying the same checks as [`Catalog::load`].
    pub fn from_categories(
        categories: impl IntoIterator<Item = (String, Vec<Question>)>,
    ) -> Result<Self, LoadError> {
        let mut catalog = Catalog::default();
        for (name, questions) in categories {
            catalog.insert(name, questions)?;
        }
        Ok(catalog)
    }

    fn insert(&mut self, name: String, questions: Vec<Question>) -> Result<(), LoadError> {
        if CATEGORY_PREFIX.len() + name.len() > MAX_PAYLOAD_BYTES {
            return Err(LoadError::CategoryNameTooLong(name));
        }
        if questions.is_empty() {
            return Err(LoadError::EmptyCategory(name));
        }
        for (index, question) in questions.iter().enumerate() {
            question
                .validate()
                .map_err(|reason| LoadError::InvalidQuestion {
                    category: name.clone(),
                    index: index + 1,
                    reason,
                })?;
        }
        self.categories.insert(name, questions);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[Question]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEOGRAPHY: &str = r#"[
        {"question": "Capital of France?", "answer_options": ["Paris", "Rome"], "correct_answer": "Paris"},
        {"question": "Longest river?", "answer_options": ["Nile", "Volga"], "correct_answer": "Nile"}
    ]"#;

    #[test]
    fn loads_json_files_as_categories() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Geography.json"), GEOGRAPHY).unwrap();
        fs::write(dir.path().join("README.md"), "not a category").unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();

        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Geography"]);
        let questions = catalog.get("Geography").unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].prompt(), "Capital of France?");
        assert!(questions[1].is_correct("Nile"));
    }

    #[test]
    fn malformed_file_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Geography.json"), GEOGRAPHY).unwrap();
        fs::write(dir.path().join("Broken.json"), "{ not json").unwrap();

        assert!(matches!(
            Catalog::load(dir.path()),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn correct_answer_must_be_an_option() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Math.json"),
            r#"[{"question": "2+2?", "answer_options": ["3", "5"], "correct_answer": "4"}]"#,
        )
        .unwrap();

        assert!(matches!(
            Catalog::load(dir.path()),
            Err(LoadError::InvalidQuestion { index: 1, .. })
        ));
    }

    #[test]
    fn empty_category_and_missing_dir_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Catalog::load(dir.path()),
            Err(LoadError::EmptyCatalog(_))
        ));

        fs::write(dir.path().join("Nothing.json"), "[]").unwrap();
        assert!(matches!(
            Catalog::load(dir.path()),
            Err(LoadError::EmptyCategory(name)) if name == "Nothing"
        ));

        assert!(matches!(
            Catalog::load(&dir.path().join("missing")),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn options_must_fit_in_button_data() {
        let long_option = "x".repeat(MAX_PAYLOAD_BYTES + 7);
        let too_long = Catalog::from_categories([(
            "Trivia".to_owned(),
            vec![Question::new(
                "Pick one",
                vec![long_option.clone(), "short".into()],
                long_option,
            )],
        )]);
        assert!(matches!(
            too_long,
            Err(LoadError::InvalidQuestion { index: 1, .. })
        ));

        let fits = "y".repeat(MAX_PAYLOAD_BYTES);
        assert!(Catalog::from_categories([(
            "Trivia".to_owned(),
            vec![Question::new("Pick one", vec![fits.clone()], fits)],
        )])
        .is_ok());
    }

    #[test]
    fn options_cannot_look_like_category_buttons() {
        let clashing = Catalog::from_categories([(
            "Trivia".to_owned(),
            vec![
                Question::new("Fine", vec!["a".into()], "a"),
                Question::new(
                    "Tricky",
                    vec!["category:Trivia".into(), "b".into()],
                    "b",
                ),
            ],
        )]);
        assert!(matches!(
            clashing,
            Err(LoadError::InvalidQuestion { index: 2, .. })
        ));
    }

    #[test]
    fn category_name_must_fit_in_button_data() {
        let name = "n".repeat(MAX_PAYLOAD_BYTES - CATEGORY_PREFIX.len() + 1);
        let questions = vec![Question::new("Q", vec!["a".into()], "a")];

        assert!(matches!(
            Catalog::from_categories([(name.clone(), questions.clone())]),
            Err(LoadError::CategoryNameTooLong(rejected)) if rejected == name
        ));
        assert!(Catalog::from_categories([(name[1..].to_owned(), questions)]).is_ok());
    }
}
