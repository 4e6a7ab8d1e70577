pub mod describe;
pub mod imgbb;
pub mod loader;
pub mod markdown;
pub mod pdf;
pub mod pipeline;
pub mod tables;

#[cfg(test)]
pub(crate) mod test_pdf;

pub use describe::{ImageDescriber, ImageHost, ImageOutcome, ImageProcessor, VisionDescriber};
pub use imgbb::ImgbbClient;
pub use loader::DocumentLoader;
pub use pipeline::{IngestionPipeline, IngestionReport};
