mod backend;
mod dto;

pub use backend::HttpAuthBackend;
