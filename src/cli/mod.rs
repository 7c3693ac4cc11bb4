pub mod chart;
pub mod export;
pub mod interactive;
pub mod report;
pub mod setup;
pub mod ui;
