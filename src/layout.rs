use crate::statics;

/// Estimated rendered height of a property card with `rows` visible rows.
pub fn card_height(rows: usize) -> f32 {
    statics::CARD_HEADER_HEIGHT + statics::CARD_TABLE_HEADER_HEIGHT
        + statics::CARD_ROW_HEIGHT * rows as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Card indices per column, each in input order, with the running heights.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Columns {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub left_height: f32,
    pub right_height: f32,
}

impl Columns {
    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    pub fn imbalance(&self) -> f32 {
        (self.left_height - self.right_height).abs()
    }

    fn push(&mut self, side: Side, idx: usize, height: f32) {
        match side {
            Side::Left => {
                self.left.push(idx);
                self.left_height += height;
            }
            Side::Right => {
                self.right.push(idx);
                self.right_height += height;
            }
        }
    }
}

/// Greedy single-pass split of cards into two columns.
///
/// A card goes to the shorter column when the columns already differ by more
/// than 0.7 of its height. Otherwise it goes left, unless that would leave the
/// columns at least 1.2 of its height apart. Never reorders within a column.
pub fn balance_columns<I>(heights: I) -> Columns
where
    I: IntoIterator<Item = f32>,
{
    let mut columns = Columns::default();
    for (idx, height) in heights.into_iter().enumerate() {
        let side = choose_side(columns.left_height, columns.right_height, height);
        columns.push(side, idx, height);
    }
    columns
}

/// [`balance_columns`] over visible row counts.
pub fn balance_rows<I>(row_counts: I) -> Columns
where
    I: IntoIterator<Item = usize>,
{
    balance_columns(row_counts.into_iter().map(card_height))
}

fn choose_side(left: f32, right: f32, height: f32) -> Side {
    if (left - right).abs() > statics::BALANCE_FORCE_RATIO * height {
        return if left <= right { Side::Left } else { Side::Right };
    }
    if (left + height - right).abs() >= statics::BALANCE_SPILL_RATIO * height {
        Side::Right
    } else {
        Side::Left
    }
}
