pub mod chat;
pub mod ingest;
pub mod onboard;
pub mod serve;
