use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting feedback report run");

        tracing::info!("Extracting survey responses...");
        let records = self.pipeline.extract().await?;
        tracing::info!("Extracted {} responses", records.len());

        tracing::info!("Aggregating feedback...");
        let bundle = self.pipeline.transform(records).await?;
        tracing::info!(
            "Aggregated {} feedback entries from {} responses",
            bundle.entries.len(),
            bundle.record_count
        );

        tracing::info!("Writing outputs...");
        let output_path = self.pipeline.load(bundle).await?;
        tracing::info!(
            "Output saved to: {} ({:?})",
            output_path,
            started.elapsed()
        );

        Ok(output_path)
    }
}
