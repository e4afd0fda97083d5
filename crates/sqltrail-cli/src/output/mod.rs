//! Output formatting modules.

pub mod csv;
pub mod html;
pub mod json;
pub mod table;

pub use csv::format_csv;
pub use html::format_html;
pub use json::format_json;
pub use table::format_table;
