pub mod metadata;
pub mod network;
pub mod spec;
pub mod state_dict;

pub use metadata::ModelMetadata;
pub use network::Network;
pub use spec::NetworkSpec;
pub use state_dict::{StateDict, Tensor};
