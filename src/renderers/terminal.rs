use crate::registry::HighlightedCode;
use crate::renderers::RenderOptions;
use crate::themes::Theme;

/// Terminal renderer via ANSI escape codes. Requires a terminal that supports truecolor
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TerminalRenderer {
    /// Decides the colors of each category, terminals have no stylesheet
    pub theme: Theme,
}

impl TerminalRenderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Render to the terminal with ANSI escape codes
    pub fn render(&self, highlighted: &HighlightedCode, options: &RenderOptions) -> String {
        let mut output = String::new();
        let line_numbers_size = options.line_number_width(highlighted.lines.len());
        let line_number_foreground = self.theme.line_number_foreground;
        let highlight_background = self.theme.highlight_background;

        let line_count = highlighted.lines.len();
        let mut lines = highlighted.lines.iter().enumerate().peekable();
        let mut first_rendered = true;
        while let Some((idx, line_tokens)) = lines.next() {
            let line_num = idx + 1; // 1-indexed

            // Special case: If the current line is the last newline of the file,
            // then don't render it. This matches the behaviour of "cat" and "bat"
            if lines.peek().is_none() && line_tokens.is_empty() && line_count > 1 {
                continue;
            }

            if options.is_hidden(line_num) {
                continue;
            }
            if !first_rendered {
                output.push('\n');
            }
            first_rendered = false;

            let is_highlighted = options.is_highlighted(line_num);

            if options.show_line_numbers {
                let line_num = options.line_number(idx);
                let line_num_s = line_num.to_string();
                let s = std::iter::repeat_n(' ', line_numbers_size - line_num_s.chars().count())
                    .chain(line_num_s.chars())
                    .collect::<String>();
                if let Some(line_number_foreground) = line_number_foreground {
                    output.push_str("\x1b[");
                    line_number_foreground.as_ansi_fg(&mut output);
                    output.push('m');
                }
                output.push_str(&format!("  {s} "));
                if line_number_foreground.is_some() {
                    // reset
                    output.push_str("\x1b[0m");
                }
            }

            // Highlight individual tokens
            for token in line_tokens {
                token.as_ansi(
                    &self.theme,
                    highlight_background.filter(|_| is_highlighted),
                    &mut output,
                )
            }
        }

        output
    }
}
