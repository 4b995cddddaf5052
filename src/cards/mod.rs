//! Forward cards: the rebroadcast form of a submission.

pub mod model;
pub mod renderer;

pub use model::{CardBlock, DEFAULT_THEMES, ForwardCard, ThemePalette};
pub use renderer::{CardRenderer, FixedTheme, RandomTheme, ThemePicker};
