//! Runs the whole chain: load, transfer, analyze, write.

use std::path::PathBuf;

use imdecl::{AnalysisStore, DeclarationGraph, TypeId};
use log::info;

use crate::{
    analyzer::ShallowAnalyzer,
    conf::ShallowConfig,
    diagnostics::Diagnostics,
    library::{LibraryLoader, LibraryWriter, LoadSummary},
    transfer::{TransferCounters, TransferMatcher},
    utils::error::ShResult,
};

/// What a pipeline run produced.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Types in analysis order.
    pub sorted: Vec<TypeId>,
    pub diagnostics: Diagnostics,
    pub loaded: LoadSummary,
    pub transfer: TransferCounters,
    pub written: Vec<PathBuf>,
}

pub struct Pipeline<'a> {
    config: &'a ShallowConfig,
    target: &'a DeclarationGraph,
}

impl<'a> Pipeline<'a> {
    /// `target` is the real code base the properties are computed for.
    pub fn new(config: &'a ShallowConfig, target: &'a DeclarationGraph) -> Self {
        Pipeline { config, target }
    }

    /// Transfers the markers of `stand_ins` onto the target and analyzes the matched types.
    ///
    /// Analyses persisted in the configured directories are loaded first and
    /// take precedence; the result is written when a target directory is set.
    pub fn run(
        &self,
        stand_ins: &DeclarationGraph,
        store: &mut AnalysisStore,
    ) -> ShResult<PipelineOutput> {
        let mut output = PipelineOutput {
            loaded: LibraryLoader::new(self.target).load(&self.config.analyzed_dirs, store)?,
            ..Default::default()
        };

        let transfer = TransferMatcher::new(stand_ins, self.target)
            .with_packages(self.config.packages.iter().cloned())
            .transfer();
        output.transfer = transfer.counters;
        output.diagnostics.extend(transfer.diagnostics);

        let mut analyzer = ShallowAnalyzer::new(self.target, &transfer.markers);
        output.sorted = analyzer.go(&transfer.types, store)?;
        output.diagnostics.extend(analyzer.into_diagnostics());

        if let Some(dir) = &self.config.target_dir {
            output.written =
                LibraryWriter::new(self.config).write(self.target, store, &output.sorted, dir)?;
        }
        info!(
            "Pipeline done: {} types analyzed, {} diagnostics, {} files written",
            output.sorted.len(),
            output.diagnostics.len(),
            output.written.len()
        );
        Ok(output)
    }
}
