//! Application layer for the Ceremony context.

pub mod orchestrator;
pub mod session;

#[cfg(test)]
pub(crate) mod test_doubles;
