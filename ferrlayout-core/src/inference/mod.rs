pub mod loader;
pub mod model;
pub mod yolo;

pub use loader::ModelLoader;
pub use model::{LayoutModel, LayoutResponse, ModelOutput, ModelSource, SharedModel};
