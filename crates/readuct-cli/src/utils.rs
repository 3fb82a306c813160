pub mod progress;
pub mod trajectory;
