mod filter;
mod metadata;
mod operation;
mod time;
mod version;

pub use self::{filter::*, metadata::*, operation::*, time::*, version::*};
