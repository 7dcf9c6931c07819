pub mod api;
pub mod app;
pub mod calendar;
pub mod config;
pub mod date_key;
pub mod edit_window;
pub mod errors;
pub mod events;
pub mod models;
pub mod optimistic;
pub mod store;
pub mod ui;

pub use api::{HabitApi, HttpHabitApi};
pub use app::connect;
pub use config::ClientConfig;
pub use date_key::{Clock, DateKey, ManualClock, SystemClock};
pub use errors::HabitError;
pub use store::HabitStore;
