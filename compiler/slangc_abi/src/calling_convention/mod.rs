pub mod function;

pub use function::{ArgAbi, FnAbi, PassMode};
