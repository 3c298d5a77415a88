pub mod quiz;
pub mod summary;

pub use quiz::{Phase, QuizOptions, QuizSession};
pub use summary::{QuizSummary, Score};
