pub mod inventory;
pub mod logs;
pub mod triage;
