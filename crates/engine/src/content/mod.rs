mod atomic_io;
mod compiler;
mod database;
mod hashing;

pub use atomic_io::{write_bytes_atomic, write_json_atomic, write_text_atomic};
pub use compiler::{
    compile_def_database, compile_def_source, ContentCompileError, ContentErrorCode,
    SourceLocation,
};
pub use database::{DefDatabase, DifficultyDef};
pub use hashing::Fingerprint;
