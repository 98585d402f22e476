pub mod error;
pub mod loader;
pub mod reduce;
pub mod label;
pub mod unemployment;
pub mod join;
pub mod encode;
pub mod pipeline;
pub mod stats;
