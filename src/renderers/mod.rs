use std::ops::RangeInclusive;

pub mod html;
pub mod terminal;

/// How to render highlighted code, independently of the output format
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_line_numbers: bool,
    pub line_number_start: isize,
    /// 1-indexed, inclusive
    pub highlight_lines: Vec<RangeInclusive<usize>>,
    /// 1-indexed, inclusive
    pub hide_lines: Vec<RangeInclusive<usize>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_line_numbers: false,
            line_number_start: 1,
            highlight_lines: Vec::new(),
            hide_lines: Vec::new(),
        }
    }
}

impl RenderOptions {
    pub(crate) fn is_hidden(&self, line_num: usize) -> bool {
        self.hide_lines.iter().any(|r| r.contains(&line_num))
    }

    pub(crate) fn is_highlighted(&self, line_num: usize) -> bool {
        self.highlight_lines.iter().any(|r| r.contains(&line_num))
    }

    /// Number displayed for the line at that 0-based index, clamped at `isize::MAX`
    pub(crate) fn line_number(&self, idx: usize) -> isize {
        self.line_number_start.saturating_add_unsigned(idx)
    }

    /// Characters needed to print the biggest line number
    pub(crate) fn line_number_width(&self, line_count: usize) -> usize {
        let last = self.line_number(line_count.saturating_sub(1));
        let first = self.line_number_start;
        first.to_string().len().max(last.to_string().len())
    }
}
