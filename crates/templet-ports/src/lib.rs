//! # templet-ports
//!
//! Finds the processes bound to a network port and terminates them:
//! - OS command dialects (`lsof`/`kill` on POSIX, `netstat`/`tasklist`/`taskkill` on Windows)
//! - [`PortProcessResolver`]: deduplicated process records for a port
//! - [`ProcessTerminator`]: sequential, fail-fast termination
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use templet_core::SystemRunner;
//! use templet_ports::{PortProcessResolver, ProcessTerminator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Arc::new(SystemRunner::new());
//! let records = PortProcessResolver::for_current_os(runner.clone())?
//!     .resolve_by_port("8080")
//!     .await?;
//! ProcessTerminator::for_current_os(runner)?
//!     .terminate(&records, "8080")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod dialect;
pub mod error;
pub mod resolver;
pub mod terminator;

pub use dialect::{dialect_for, PortDialect, PosixDialect, WindowsDialect};
pub use error::{Error, Result};
pub use resolver::{parse_port, PortProcessResolver};
pub use terminator::{ProcessTerminator, TerminationReport};
