use crate::app::{App, AssemblySink, DisplayRecord};
use crate::domain::StudyId;
use crate::error::ExplorerError;

/// Owns the current position in the catalog; every move saturates.
#[derive(Debug, Clone)]
pub struct Navigator<'a> {
    app: &'a App,
    index: usize,
}

impl<'a> Navigator<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.app.study_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn last_index(&self) -> usize {
        self.len().saturating_sub(1)
    }

    pub fn current(&self, sink: &dyn AssemblySink) -> Result<DisplayRecord, ExplorerError> {
        self.app.assemble(self.index, sink)
    }

    pub fn step_forward(&mut self, sink: &dyn AssemblySink) -> Result<DisplayRecord, ExplorerError> {
        self.index = (self.index + 1).min(self.last_index());
        self.current(sink)
    }

    pub fn step_backward(
        &mut self,
        sink: &dyn AssemblySink,
    ) -> Result<DisplayRecord, ExplorerError> {
        self.index = self.index.saturating_sub(1);
        self.current(sink)
    }

    pub fn go_to(
        &mut self,
        index: usize,
        sink: &dyn AssemblySink,
    ) -> Result<DisplayRecord, ExplorerError> {
        self.index = index.min(self.last_index());
        self.current(sink)
    }

    pub fn first(&mut self, sink: &dyn AssemblySink) -> Result<DisplayRecord, ExplorerError> {
        self.go_to(0, sink)
    }

    pub fn last(&mut self, sink: &dyn AssemblySink) -> Result<DisplayRecord, ExplorerError> {
        self.go_to(self.last_index(), sink)
    }

    pub fn go_to_study(
        &mut self,
        study: StudyId,
        sink: &dyn AssemblySink,
    ) -> Result<DisplayRecord, ExplorerError> {
        let index = self
            .app
            .catalog()
            .position_of(study)
            .ok_or_else(|| ExplorerError::StudyNotCataloged(study.to_string()))?;
        self.go_to(index, sink)
    }
}
