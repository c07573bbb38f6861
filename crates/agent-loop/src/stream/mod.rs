pub mod emitter;
pub mod handler;

pub use emitter::EventEmitter;
