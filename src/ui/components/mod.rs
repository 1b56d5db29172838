pub mod checker_report;
pub mod dashboard;
pub mod event_log;
pub mod keyboard_view;
pub mod tab_bar;
pub mod typing_area;
