//! sqlgrade-report: CSV and HTML exports of assessment submissions.

pub mod csv;
pub mod html;
