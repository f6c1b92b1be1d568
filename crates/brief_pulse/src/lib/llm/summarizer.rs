use std::{fmt::Debug, future::Future};

pub trait Summarizer {
    /// Input token budget for a single completion call. The chunk planner
    /// splits transcripts that do not fit under this minus the prompt reserve.
    const CONTEXT_WINDOW_LIMIT: usize = 128_000 - 18_000;
    const SUMMARIZER_MODEL: &'static str;

    type Error: Debug;

    /// Send a prompt to the model and return its raw text output. The output
    /// is expected to be JSON-shaped but is not guaranteed valid; callers run
    /// it through lenient extraction.
    fn complete(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
