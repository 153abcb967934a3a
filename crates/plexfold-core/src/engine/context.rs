use super::cache::MsaLibrary;
use super::config::FoldConfig;
use super::progress::ProgressReporter;
use super::recycle::ConvergenceMetric;
use super::runners::{AlignmentSearch, FoldingModel};
use super::sampling::CancelToken;

/// Everything a folding workflow needs besides the input itself: the
/// configuration, the cache namespace, and the seams to the external
/// collaborators.
#[derive(Clone, Copy)]
pub struct FoldContext<'a> {
    pub config: &'a FoldConfig,
    pub library: &'a MsaLibrary,
    pub search: &'a dyn AlignmentSearch,
    pub models: &'a [Box<dyn FoldingModel>],
    pub metric: &'a dyn ConvergenceMetric,
    pub cancel: &'a CancelToken,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> FoldContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &'a FoldConfig,
        library: &'a MsaLibrary,
        search: &'a dyn AlignmentSearch,
        models: &'a [Box<dyn FoldingModel>],
        metric: &'a dyn ConvergenceMetric,
        cancel: &'a CancelToken,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            library,
            search,
            models,
            metric,
            cancel,
            reporter,
        }
    }
}
