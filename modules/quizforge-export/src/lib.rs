pub mod diagram;
pub mod mctest;
pub mod renderer;
pub mod typeset;
pub mod vpl;

pub use diagram::ClassDiagram;
pub use renderer::{ArtifactRenderer, RenderSummary};
