//! Bordered ASCII rendering of the grid, used by tests and the
//! `diagram_get` command.

use silt_core::WorldData;

/// Render the grid: two characters per cell, one space between cells,
/// `+---+` border rows, `|` side borders.
///
/// ```text
/// +--------+
/// |DD WW   |
/// |   ww   |
/// +--------+
/// ```
pub fn ascii_diagram(data: &WorldData) -> String {
    let width = data.width as usize;
    let mut out = String::with_capacity((width * 3 + 3) * (data.height as usize + 2));

    let border = |out: &mut String| {
        out.push('+');
        for x in 0..width {
            out.push_str("--");
            if x < width - 1 {
                out.push('-');
            }
        }
        out.push_str("+\n");
    };

    border(&mut out);
    for y in 0..data.height {
        out.push('|');
        for x in 0..data.width {
            out.push_str(data.cells[data.index(x, y)].glyph());
            if x < data.width - 1 {
                out.push(' ');
            }
        }
        out.push_str("|\n");
    }
    border(&mut out);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_core::{Cell, Material};

    #[test]
    fn renders_borders_and_glyphs() {
        let mut data = WorldData::new(3, 2);
        *data.cell_mut(0, 0).unwrap() = Cell::full(Material::Dirt);
        *data.cell_mut(2, 0).unwrap() = Cell::full(Material::Wall);
        *data.cell_mut(1, 1).unwrap() = Cell {
            fill_ratio: 0.3,
            ..Cell::full(Material::Water)
        };

        let diagram = ascii_diagram(&data);
        let expected = "\
+--------+
|DD    ##|
|   ww   |
+--------+
";
        assert_eq!(diagram, expected);
    }

    #[test]
    fn every_row_has_equal_width() {
        let data = WorldData::new(7, 4);
        let diagram = ascii_diagram(&data);
        let widths: Vec<usize> = diagram.lines().map(str::len).collect();
        assert_eq!(widths.len(), 6);
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn single_column_grid() {
        let data = WorldData::new(1, 1);
        assert_eq!(ascii_diagram(&data), "+--+\n|  |\n+--+\n");
    }
}
