pub mod answer;
pub mod attempt;
pub mod document;
pub mod generation;
pub mod question;
