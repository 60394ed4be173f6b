mod conversation;
mod search;


pub use conversation::*;
pub use search::*;
