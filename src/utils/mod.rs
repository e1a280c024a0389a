pub mod mailer;
pub mod pdf;
pub mod spreadsheet;
