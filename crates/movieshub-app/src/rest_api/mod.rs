pub mod movie;
mod paging;
pub mod validate;

pub use paging::Paging;
