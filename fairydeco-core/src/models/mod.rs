pub mod id;

pub use id::BookId;
