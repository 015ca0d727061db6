pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    banner, block, dim, error, header, info, muted, reference, section, status, success, verse_block, warn,
};
pub use progress::{SeedProgressBar, Spinner};
pub use table::{match_table, stats_table, MatchRow, TableBuilder};
pub use theme::{theme, Theme};
