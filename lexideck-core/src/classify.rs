use crate::Grade;

pub const ADVANCE_LABEL: &str = "Next";
pub const REVEAL_LABEL: &str = "Show meaning";

pub fn grade_label(grade: Grade) -> &'static str {
    match grade {
        Grade::Best => "Perfect",
        Grade::Good => "Good",
        Grade::Fair => "Fuzzy",
        Grade::Poor => "Forgot",
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Advance,
    Reveal,
    Grade(Grade),
    Unrecognized,
}

/// Maps raw chat text onto a session input. Matching is exact: no trimming,
/// no case folding.
pub fn classify(text: &str) -> Input {
    if text == ADVANCE_LABEL {
        return Input::Advance;
    }
    if text == REVEAL_LABEL {
        return Input::Reveal;
    }
    Grade::ALL
        .into_iter()
        .find(|g| grade_label(*g) == text)
        .map(Input::Grade)
        .unwrap_or(Input::Unrecognized)
}
