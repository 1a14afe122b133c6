pub mod dense;
pub mod dropout;

pub use dense::Linear;
pub use dropout::Dropout;
