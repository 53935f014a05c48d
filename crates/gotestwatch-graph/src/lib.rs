pub mod resolver;
pub mod reverse_index;

#[cfg(test)]
mod test_support;

pub use resolver::resolve;
pub use reverse_index::ReverseIndex;
