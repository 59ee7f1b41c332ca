pub use crate::repository::{find, find_from_pool};
