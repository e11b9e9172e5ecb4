//! Minimal PresentationML (`.pptx`) package writer and reader.
//!
//! Only what a picture-per-slide deck needs: one slide master, one blank
//! layout, one theme, and one picture shape per slide.

pub mod error;
pub mod geometry;
mod parts;
pub mod presentation;
pub mod reader;

pub use error::PptxError;
pub use geometry::{Rect, SlideSize, EMU_PER_INCH};
pub use presentation::{ImageFormat, Presentation};
pub use reader::{DeckReader, SlidePicture};
