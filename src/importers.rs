// ! Importers for the weekly Hydronomics monitoring workbook

pub mod hydronomics_sheet;
pub mod template;

// Re-export commonly used items
pub use hydronomics_sheet::{week_columns, SheetExtractor, WeekColumn};
pub use template::{build_template, populate_template, retarget_template};
