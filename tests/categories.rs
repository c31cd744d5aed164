use std::path::Path;

use triviabot::catalog::Catalog;

#[test]
fn bundled_categories_are_valid() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("categories");
    let catalog = Catalog::load(&dir).unwrap();

    let names: Vec<_> = catalog.names().collect();
    assert_eq!(names, vec!["Geography", "History", "Science"]);
    for name in names {
        let questions = catalog.get(name).unwrap();
        assert!(questions
            .iter()
            .all(|question| question.answer_options().iter().any(|o| question.is_correct(o))));
    }
}
