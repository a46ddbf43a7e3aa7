pub mod assistant;
pub mod export;
pub mod generate;
pub mod health;
pub mod session;
