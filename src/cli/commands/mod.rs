mod create_user;
mod init;
mod serve;

pub use create_user::cmd_create_user;
pub use init::cmd_init;
pub use serve::cmd_serve;
