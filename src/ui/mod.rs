pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{empty, header, info, section, status, success, warn};
pub use table::{format_money, groups_table, metrics_table, records_table, TableBuilder};
pub use theme::{theme, Theme};
