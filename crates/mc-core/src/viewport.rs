//! Selection, scroll offset and vim-style count accumulation for a list
//! whose length can change underneath the user.

const MAX_PREFIX_DIGITS: usize = 6;

/// Pending numeric repeat count typed before a motion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotionPrefix {
    digits: String,
}

impl MotionPrefix {
    /// Accumulates `ch` if it is a count digit. `0` only counts once a prefix
    /// has started.
    pub fn push(&mut self, ch: char) -> bool {
        if !ch.is_ascii_digit() || (ch == '0' && self.digits.is_empty()) {
            return false;
        }
        if self.digits.len() < MAX_PREFIX_DIGITS {
            self.digits.push(ch);
        }
        true
    }

    /// Consumes the prefix. `None` means no count was typed.
    pub fn take(&mut self) -> Option<usize> {
        let digits = std::mem::take(&mut self.digits);
        digits.parse::<usize>().ok().filter(|count| *count > 0)
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Down,
    Up,
    First,
    Last,
    HalfPageDown,
    HalfPageUp,
}

/// Visible window over a list of `len` rows.
///
/// After every operation, for a non-empty list:
/// `scroll <= selection < scroll + height` and `selection < len`.
/// For an empty list both are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    selection: usize,
    scroll: usize,
    height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            selection: 0,
            scroll: 0,
            height: height.max(1),
        }
    }

    pub fn selection(&self) -> usize {
        self.selection
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Selected row, or `None` when the list is empty.
    pub fn selected(&self, len: usize) -> Option<usize> {
        (self.selection < len).then_some(self.selection)
    }

    pub fn set_height(&mut self, height: usize, len: usize) {
        self.height = height.max(1);
        self.clamp(len);
    }

    pub fn reset(&mut self) {
        self.selection = 0;
        self.scroll = 0;
    }

    /// Re-validates selection and scroll against a new list length.
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.reset();
            return;
        }
        self.selection = self.selection.min(len - 1);
        self.scroll = self.scroll.min(len.saturating_sub(self.height));
        self.ensure_visible();
    }

    pub fn apply(&mut self, motion: Motion, count: Option<usize>, len: usize) {
        if len == 0 {
            self.reset();
            return;
        }
        let last = len - 1;
        let repeat = count.unwrap_or(1);
        let half_page = (self.height / 2).max(1);
        self.selection = match motion {
            Motion::Down => self.selection.saturating_add(repeat).min(last),
            Motion::Up => self.selection.saturating_sub(repeat),
            Motion::First => 0,
            Motion::Last => match count {
                Some(line) => line.saturating_sub(1).min(last),
                None => last,
            },
            Motion::HalfPageDown => self
                .selection
                .saturating_add(half_page.saturating_mul(repeat))
                .min(last),
            Motion::HalfPageUp => self
                .selection
                .saturating_sub(half_page.saturating_mul(repeat)),
        };
        self.ensure_visible();
    }

    /// Selects `row` if it exists.
    pub fn select(&mut self, row: usize, len: usize) -> bool {
        if row >= len {
            return false;
        }
        self.selection = row;
        self.ensure_visible();
        true
    }

    /// Row index under a viewport-relative line, if that line shows a row.
    pub fn row_at(&self, line: usize, len: usize) -> Option<usize> {
        if line >= self.height {
            return None;
        }
        let row = self.scroll + line;
        (row < len).then_some(row)
    }

    fn ensure_visible(&mut self) {
        if self.selection < self.scroll {
            self.scroll = self.selection;
        } else if self.selection >= self.scroll + self.height {
            self.scroll = self.selection + 1 - self.height;
        }
    }
}

/// Scrollbar thumb as `(position, height)` in track cells.
pub fn scrollbar_thumb(selection: usize, len: usize, track: usize) -> (usize, usize) {
    if track == 0 || len == 0 {
        return (0, 0);
    }
    let thumb = (track * track / len).clamp(1, track);
    let travel = track - thumb;
    let span = len.saturating_sub(track).max(1);
    let position = (selection * travel / span).min(travel);
    (position, thumb)
}
