use crate::errors::HeckError;
use crate::types::CorrectedCommand;

/// Cursor over a lazily produced sequence of corrected commands.
///
/// Only the first candidate is pulled up front. The rest of the sequence is
/// realized on the first move, since wrapping around needs the total count.
pub struct CommandSelector<I>
where
    I: Iterator<Item = CorrectedCommand>,
{
    commands: I,
    realized: Vec<CorrectedCommand>,
    fully_realized: bool,
    index: usize,
}

impl<I> CommandSelector<I>
where
    I: Iterator<Item = CorrectedCommand>,
{
    /// Fails with [`HeckError::NoRuleMatched`] when the sequence is empty.
    pub fn new(mut commands: I) -> Result<Self, HeckError> {
        let first = commands.next().ok_or(HeckError::NoRuleMatched)?;
        Ok(Self {
            commands,
            realized: vec![first],
            fully_realized: false,
            index: 0,
        })
    }

    fn realize(&mut self) {
        if !self.fully_realized {
            self.realized.extend(self.commands.by_ref());
            self.fully_realized = true;
        }
    }

    pub fn next(&mut self) {
        self.realize();
        self.index = (self.index + 1) % self.realized.len();
    }

    pub fn previous(&mut self) {
        self.realize();
        let len = self.realized.len();
        self.index = (self.index + len - 1) % len;
    }

    pub fn value(&self) -> &CorrectedCommand {
        &self.realized[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn into_value(mut self) -> CorrectedCommand {
        self.realized.swap_remove(self.index)
    }
}
