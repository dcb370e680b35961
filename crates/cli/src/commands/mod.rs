pub mod gateway;
pub mod init;
pub mod run;
