mod components;
pub use components::ExportLinks;

mod login;
pub use login::Login;

mod register;
pub use register::Register;

mod dashboard;
pub use dashboard::Dashboard;

mod cabs;
pub use cabs::Cabs;

mod drivers;
pub use drivers::Drivers;

mod expenses;
pub use expenses::Expenses;

mod sub_admins;
pub use sub_admins::SubAdmins;

mod settings;
pub use settings::Settings;
