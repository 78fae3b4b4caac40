//! Process wiring: database bootstrap and state assembly from config.

pub mod db;
pub mod state;
