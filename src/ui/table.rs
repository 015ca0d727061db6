use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

/// One row per ranked verse candidate
#[derive(Tabled)]
pub struct MatchRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    #[tabled(rename = "Verse")]
    pub reference: String,
    #[tabled(rename = "Score")]
    pub score: String,
    #[tabled(rename = "Transliteration")]
    pub transliteration: String,
}

pub fn match_table(rows: &[MatchRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_table() {
        let table = stats_table(&[("Verses", "701".to_string()), ("Chapters", "18".to_string())]);
        assert!(table.contains("Metric"));
        assert!(table.contains("Verses"));
        assert!(table.contains("701"));
        assert!(stats_table(&[]).is_empty());
    }

    #[test]
    fn test_match_table() {
        let table = match_table(&[MatchRow {
            rank: 1,
            reference: "BG 9.34".into(),
            score: "0.81".into(),
            transliteration: "manmanā bhava".into(),
        }]);
        assert!(table.contains("BG 9.34"));
        assert!(table.contains("0.81"));
    }
}
