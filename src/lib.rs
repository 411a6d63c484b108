pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod ctx;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod index;
pub mod io;
pub mod model;
pub mod pairing;
pub mod pipeline;
pub mod sampling;
pub mod schema;
