pub mod chat_stream;
pub mod models;
pub mod tools;
