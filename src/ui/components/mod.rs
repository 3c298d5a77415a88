pub mod flashcard;
pub mod progress_bar;
pub mod progress_table;
pub mod script_menu;
pub mod summary;
