use std::path::PathBuf;

use brief_datastore::JobStore;

use crate::{
    acquire::{AudioFetcher, FetchStrategy},
    processor::ChunkingConfig,
    subtitle::MergeConfig,
    JobProcessor, Summarizer, Transcriber,
};

pub struct JobProcessorBuilder<J = (), F = (), T = (), S = ()> {
    workdir: PathBuf,
    store: J,
    fetcher: F,
    transcriber: T,
    summarizer: S,
    strategies: Vec<FetchStrategy>,
    merge_config: MergeConfig,
    chunking_config: Option<ChunkingConfig>,
}

impl JobProcessorBuilder {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            store: (),
            fetcher: (),
            transcriber: (),
            summarizer: (),
            strategies: FetchStrategy::defaults(),
            merge_config: MergeConfig::default(),
            chunking_config: None,
        }
    }
}

impl<J, F, T, S> JobProcessorBuilder<J, F, T, S> {
    pub fn store<J2: JobStore + Send + Sync + 'static>(
        self,
        store: J2,
    ) -> JobProcessorBuilder<J2, F, T, S> {
        JobProcessorBuilder {
            workdir: self.workdir,
            store,
            fetcher: self.fetcher,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            strategies: self.strategies,
            merge_config: self.merge_config,
            chunking_config: self.chunking_config,
        }
    }

    pub fn fetcher<F2: AudioFetcher + Send + Sync + 'static>(
        self,
        fetcher: F2,
    ) -> JobProcessorBuilder<J, F2, T, S> {
        JobProcessorBuilder {
            workdir: self.workdir,
            store: self.store,
            fetcher,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            strategies: self.strategies,
            merge_config: self.merge_config,
            chunking_config: self.chunking_config,
        }
    }

    pub fn transcriber<T2: Transcriber + Send + Sync + 'static>(
        self,
        transcriber: T2,
    ) -> JobProcessorBuilder<J, F, T2, S> {
        JobProcessorBuilder {
            workdir: self.workdir,
            store: self.store,
            fetcher: self.fetcher,
            transcriber,
            summarizer: self.summarizer,
            strategies: self.strategies,
            merge_config: self.merge_config,
            chunking_config: self.chunking_config,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync + 'static>(
        self,
        summarizer: S2,
    ) -> JobProcessorBuilder<J, F, T, S2> {
        JobProcessorBuilder {
            workdir: self.workdir,
            store: self.store,
            fetcher: self.fetcher,
            transcriber: self.transcriber,
            summarizer,
            strategies: self.strategies,
            merge_config: self.merge_config,
            chunking_config: self.chunking_config,
        }
    }

    pub fn strategies(mut self, strategies: Vec<FetchStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn merge_config(mut self, merge_config: MergeConfig) -> Self {
        self.merge_config = merge_config;
        self
    }

    pub fn with_chunking(mut self, chunk_duration_seconds: u16) -> Self {
        self.chunking_config = Some(ChunkingConfig {
            chunk_duration_seconds,
        });
        self
    }
}

impl<J, F, T, S> JobProcessorBuilder<J, F, T, S>
where
    J: JobStore + Send + Sync + 'static,
    F: AudioFetcher + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    pub fn build(self) -> JobProcessor<J, F, T, S> {
        JobProcessor {
            workdir: self.workdir,
            store: self.store,
            fetcher: self.fetcher,
            transcriber: self.transcriber,
            summarizer: self.summarizer,
            strategies: self.strategies,
            merge_config: self.merge_config,
            chunking_config: self.chunking_config,
        }
    }
}
