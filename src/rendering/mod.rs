pub mod frame;

pub use frame::FrameRenderer;
