mod cab;
mod driver;
mod error;
pub mod expense;
pub mod form;
pub mod listing;
pub mod notification;
mod permissions;
mod session;
mod sub_admin;

pub use cab::{Cab, CabDraft, CabStatus};
pub use driver::{Driver, DriverDraft};
pub use error::{Error, Result};
pub use expense::{Breakdown, Category, Expense, ExpenseDraft, ExpenseList, ExpenseSource, ExpenseSummary};
pub use form::{FieldErrors, LoginForm, RegisterForm};
pub use notification::{Notification, Severity};
pub use permissions::{Feature, Permissions};
pub use session::{Profile, Role, SESSION_COOKIE_NAME, UserData};
pub use sub_admin::{InviteStatus, SubAdmin, SubAdminDraft, SubAdminStatus};

#[doc(hidden)]
pub use anyhow::anyhow as internal_anyhow_dont_use;
