//! Presentational components shared by the dashboard views.

mod card;
pub mod chart;
mod field;
mod listing;
mod modal;
mod notice;

pub use card::StatCard;
pub use chart::{BarChart, LineChart, PieChart};
pub use field::{SelectField, TextField};
pub use listing::{Pagination, SearchBar};
pub use modal::{ConfirmDelete, Modal};
pub use notice::NotificationBanner;
