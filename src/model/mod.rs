pub mod cash;
pub mod department;
pub mod employee;
pub mod session;
pub mod upload;
pub mod user;
