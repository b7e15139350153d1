/// Long-running step that reports progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Segmenting,
    Mixing,
    Writing,
}

/// Progress notification emitted while segmenting, mixing or writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A stage begins and will perform `total` units of work.
    Start { stage: Stage, total: usize },
    /// `completed` out of `total` units are done.
    Advance {
        stage: Stage,
        completed: usize,
        total: usize,
    },
    /// The stage finished successfully.
    Finish { stage: Stage },
}

/// Receiver of [`ProgressEvent`]s.
///
/// The default implementation ignores events. Any `FnMut(ProgressEvent)`
/// closure is a reporter.
pub trait ProgressReporter {
    fn report(&mut self, _event: ProgressEvent) {}
}

impl<F> ProgressReporter for F
where
    F: FnMut(ProgressEvent),
{
    fn report(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Reporter that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Emits `Start`, one `Advance` per unit and `Finish` for a single stage.
pub(crate) struct StageProgress<'a, P: ProgressReporter + ?Sized> {
    reporter: &'a mut P,
    stage: Stage,
    total: usize,
    completed: usize,
}

impl<'a, P: ProgressReporter + ?Sized> StageProgress<'a, P> {
    pub(crate) fn start(reporter: &'a mut P, stage: Stage, total: usize) -> Self {
        reporter.report(ProgressEvent::Start { stage, total });
        Self {
            reporter,
            stage,
            total,
            completed: 0,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.completed += 1;
        self.reporter.report(ProgressEvent::Advance {
            stage: self.stage,
            completed: self.completed,
            total: self.total,
        });
    }

    pub(crate) fn finish(self) {
        self.reporter.report(ProgressEvent::Finish { stage: self.stage });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_receive_every_event() {
        let mut events = Vec::new();
        let mut reporter = |event: ProgressEvent| events.push(event);
        let mut progress = StageProgress::start(&mut reporter, Stage::Mixing, 2);
        progress.advance();
        progress.advance();
        progress.finish();

        assert_eq!(
            events,
            vec![
                ProgressEvent::Start {
                    stage: Stage::Mixing,
                    total: 2
                },
                ProgressEvent::Advance {
                    stage: Stage::Mixing,
                    completed: 1,
                    total: 2
                },
                ProgressEvent::Advance {
                    stage: Stage::Mixing,
                    completed: 2,
                    total: 2
                },
                ProgressEvent::Finish {
                    stage: Stage::Mixing
                },
            ]
        );
    }
}
