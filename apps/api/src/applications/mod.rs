// Application Record Service
// Implements: the three submission phases (details, resume, responses) and
// the read endpoints over a pluggable record store and file storage.

pub mod handlers;
pub mod pg_store;
pub mod phases;
pub mod storage;
pub mod store;
pub mod upload;
pub mod validation;
