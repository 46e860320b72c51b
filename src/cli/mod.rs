pub mod refresh;
pub mod setup;
pub mod ui;
