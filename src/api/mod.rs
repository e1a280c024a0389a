pub mod cash;
pub mod department;
pub mod employee;
pub mod report;
pub mod session;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;
