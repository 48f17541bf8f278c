//! Webship FTP - Remote store adapter over FTP
//!
//! Implements the `IRemoteStore` port on top of the blocking `ftp` client.
//! Every operation hops onto the async runtime's blocking pool; the
//! session object is owned by exactly one sync run for its lifetime.

mod store;

pub use store::FtpRemoteStore;
