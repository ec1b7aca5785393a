use super::style::visible_width;

/// Box-drawn table; column widths count visible characters only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 4);

        lines.push(border(&widths, '┌', '┬', '┐'));
        lines.push(line(&self.headers, &widths));
        lines.push(border(&widths, '├', '┼', '┤'));
        for row in &self.rows {
            lines.push(line(row, &widths));
        }
        lines.push(border(&widths, '└', '┴', '┘'));

        lines.join("\n")
    }

    fn column_widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        (0..columns)
            .map(|index| {
                std::iter::once(&self.headers)
                    .chain(&self.rows)
                    .filter_map(|cells| cells.get(index))
                    .map(|cell| visible_width(cell))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|width| "─".repeat(width + 2)).collect();
    format!("{left}{}{right}", segments.join(&middle.to_string()))
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let cell = cells.get(index).map(String::as_str).unwrap_or("");
            let padding = width.saturating_sub(visible_width(cell));
            format!(" {cell}{} ", " ".repeat(padding))
        })
        .collect();
    format!("│{}│", padded.join("│"))
}

#[cfg(test)]
mod tests {
    use super::super::style::{Palette, Style, strip_ansi};
    use super::*;

    #[test]
    fn table_renders_box_with_aligned_columns() {
        let mut table = Table::new(["Time", "Temp"]);
        table.push_row(["06:00", "4.5"]);
        table.push_row(["12:00", "11.0"]);

        assert_eq!(
            table.render(),
            "┌───────┬──────┐\n\
             │ Time  │ Temp │\n\
             ├───────┼──────┤\n\
             │ 06:00 │ 4.5  │\n\
             │ 12:00 │ 11.0 │\n\
             └───────┴──────┘"
        );
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn table_ignores_escape_sequences_when_sizing() {
        let palette = Palette::new(true);
        let mut table = Table::new(["Temp"]);
        table.push_row([palette.paint(Style::Red, "31.0")]);
        table.push_row(["-2.0".to_string()]);

        let rendered = table.render();
        let widths: Vec<usize> = rendered
            .lines()
            .map(|line| strip_ansi(line).chars().count())
            .collect();

        assert!(widths.iter().all(|width| *width == widths[0]));
        assert_eq!(widths[0], 8);
    }

    #[test]
    fn table_pads_short_rows() {
        let mut table = Table::new(["A", "B"]);
        table.push_row(["only"]);

        let rendered = table.render();
        assert!(rendered.contains("│ only │   │"));
    }
}
