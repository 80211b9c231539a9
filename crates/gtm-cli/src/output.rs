use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Plain aligned-column table. The last column is left unpadded so long
/// cells like event ids do not produce trailing whitespace.
pub struct Table {
    columns: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: &[&'static str]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn print(&self) {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .fold(col.len(), |w, cell| w.max(cell.len()))
            })
            .collect();

        print_row(&widths, self.columns.iter().map(|c| c.to_string()));
        print_row(&widths, widths.iter().map(|w| "-".repeat(*w)));
        for row in &self.rows {
            print_row(&widths, row.iter().cloned());
        }
    }
}

fn print_row(widths: &[usize], cells: impl Iterator<Item = String>) {
    let last = widths.len().saturating_sub(1);
    let line: Vec<String> = cells
        .zip(widths.iter().copied())
        .enumerate()
        .map(|(i, (cell, w))| {
            if i == last {
                cell
            } else {
                format!("{cell:<w$}")
            }
        })
        .collect();
    println!("{}", line.join("  "));
}
