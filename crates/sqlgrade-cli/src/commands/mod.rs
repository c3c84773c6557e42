pub mod check;
pub mod init;
pub mod normalize;
pub mod results;
pub mod take;
pub mod validate;
