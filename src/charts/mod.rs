//! Charts module - Static chart rendering and dashboard plots

mod artifact;
mod plotter;
pub mod prep;
mod renderer;
mod visualizer;

pub use artifact::{ChartArtifact, ChartKey, ChartKind};
pub use plotter::{rank_by_mean, ChartPlotter, CountrySummary};
pub use renderer::ChartRenderer;
pub use visualizer::{save_artifacts, ChartError, RenderReport, RenderWarning, Rendered, Visualizer};
