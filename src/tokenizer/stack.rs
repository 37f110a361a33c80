use crate::grammars::{CompiledGrammar, ModeId, ROOT_MODE_ID};

/// A mode currently open, with the pattern that ends it once `ends_with_parent` is resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Frame {
    pub mode: ModeId,
    pub terminator_end: Option<String>,
    /// Index of the region this mode opened, if it has a category
    pub region: Option<usize>,
}

/// The open modes, outermost first. Never empty: the root stays at the bottom.
///
/// Nesting is tracked here rather than on the call stack so arbitrarily deep input (nested
/// function types, long chains of parentheses) can't overflow.
#[derive(Debug, Clone)]
pub(crate) struct ModeStack {
    frames: Vec<Frame>,
}

impl ModeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                mode: ROOT_MODE_ID,
                terminator_end: None,
                region: None,
            }],
        }
    }

    pub fn top(&self) -> &Frame {
        // the root is never popped
        &self.frames[self.frames.len() - 1]
    }

    pub fn get(&self, depth: usize) -> &Frame {
        &self.frames[depth]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, grammar: &CompiledGrammar, mode: ModeId, region: Option<usize>) {
        let terminator_end = grammar.terminator_end(mode, self.top().terminator_end.as_deref());
        self.frames.push(Frame {
            mode,
            terminator_end,
            region,
        });
    }

    /// Pops the top frame unless it is the root
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammars::{RawGrammar, RawMode};

    #[test]
    fn root_cannot_be_popped() {
        let mut stack = ModeStack::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().mode, ROOT_MODE_ID);
    }

    #[test]
    fn ends_with_parent_inherits_the_end() {
        let raw = RawGrammar {
            name: "t".to_owned(),
            contains: vec![
                RawMode::new()
                    .begin("a")
                    .end(";")
                    .contains(vec![RawMode::new().begin("b").ends_with_parent().into()])
                    .into(),
            ],
            ..Default::default()
        };
        let grammar = raw.compile().unwrap();
        let outer = grammar.mode(ROOT_MODE_ID).contains[0];
        let inner = grammar.mode(outer).contains[0];

        let mut stack = ModeStack::new();
        stack.push(&grammar, outer, None);
        stack.push(&grammar, inner, Some(0));
        assert_eq!(stack.top().terminator_end.as_deref(), Some(";"));
        assert_eq!(stack.get(1).terminator_end.as_deref(), Some(";"));
        assert_eq!(stack.pop().and_then(|f| f.region), Some(0));
        assert_eq!(stack.top().mode, outer);
    }
}
