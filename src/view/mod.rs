pub mod classify;
pub mod image;

pub use self::classify::{format_probabilities, render_classify, view_classify};
pub use self::image::{image_bytes_to_input, image_to_input, imshow};
