pub mod distractor;
pub mod mutate;
pub mod question;
pub mod sanitize;
pub mod selector;
pub mod similarity;

pub use question::{KindPolicy, Question, QuestionKind, generate_question};
pub use selector::{SelectionMode, Selector};
