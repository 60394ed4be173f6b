use serde::Serialize;

use crate::model::{display_rows, SearchResultRow};

/// What a single result shows: the poster when there is one, otherwise the
/// title in its place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultCell {
    Poster { uri: String, title: String },
    Title { title: String },
}

impl ResultCell {
    pub fn title(&self) -> &str {
        match self {
            ResultCell::Poster { title, .. } | ResultCell::Title { title } => title,
        }
    }
}

/// Search results laid out for display, in relevance order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultGrid {
    width: usize,
    cells: Vec<ResultCell>,
}

impl ResultGrid {
    pub fn from_rows(rows: &[SearchResultRow], width: usize) -> Self {
        let cells = rows
            .iter()
            .map(|row| match row.poster_uri() {
                Some(uri) => ResultCell::Poster {
                    uri,
                    title: row.title.clone(),
                },
                None => ResultCell::Title {
                    title: row.title.clone(),
                },
            })
            .collect();
        Self {
            width: width.max(1),
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cells(&self) -> &[ResultCell] {
        &self.cells
    }

    pub fn rows(&self) -> Vec<&[ResultCell]> {
        display_rows(&self.cells, self.width)
    }

    pub fn row_count(&self) -> usize {
        self.cells.len().div_ceil(self.width)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Poster data URIs, in result order.
    pub fn images(&self) -> Vec<String> {
        self.cells
            .iter()
            .filter_map(|c| match c {
                ResultCell::Poster { uri, .. } => Some(uri.clone()),
                ResultCell::Title { .. } => None,
            })
            .collect()
    }

    /// Titles of the results that had no poster, in result order.
    pub fn titles(&self) -> Vec<String> {
        self.cells
            .iter()
            .filter_map(|c| match c {
                ResultCell::Title { title } => Some(title.clone()),
                ResultCell::Poster { .. } => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize, with_poster: usize) -> Vec<SearchResultRow> {
        (0..n)
            .map(|i| SearchResultRow {
                title: format!("Movie {i}"),
                tagline: format!("Tagline {i}"),
                poster: (i < with_poster).then(|| format!("b64-{i}")),
            })
            .collect()
    }

    #[test]
    fn test_seven_rows_three_posters() {
        let grid = ResultGrid::from_rows(&rows(7, 3), 5);
        assert_eq!(grid.images().len(), 3);
        assert_eq!(grid.titles().len(), 4);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.rows()[1].len(), 2);
        assert_eq!(grid.images()[0], "data:image/png;base64,b64-0");
        assert_eq!(grid.titles()[0], "Movie 3");
    }

    #[test]
    fn test_every_result_lands_in_exactly_one_list() {
        for n in 0..=10 {
            for posters in 0..=n {
                let grid = ResultGrid::from_rows(&rows(n, posters), 5);
                assert_eq!(grid.images().len() + grid.titles().len(), n);
                assert_eq!(grid.row_count(), n.div_ceil(5));
                assert_eq!(grid.rows().len(), grid.row_count());
            }
        }
    }

    #[test]
    fn test_cell_title_available_for_posters() {
        let grid = ResultGrid::from_rows(&rows(1, 1), 5);
        assert_eq!(grid.cells()[0].title(), "Movie 0");
    }

    #[test]
    fn test_zero_width_becomes_one() {
        let grid = ResultGrid::from_rows(&rows(3, 0), 0);
        assert_eq!(grid.width(), 1);
        assert_eq!(grid.row_count(), 3);
    }
}
