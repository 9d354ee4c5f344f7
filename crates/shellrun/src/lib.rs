//! # Shellrun
//!
//! A single narrow capability for running external commands: hand it a
//! shell script, get back captured text output and an exit code.
//!
//! ## Core Concepts
//!
//! - **Invocation**: a shell script plus an optional working directory
//! - **CommandOutput**: captured stdout/stderr and the exit code
//! - **Executor**: the capability trait every backend implements
//!
//! Two backends ship with the crate:
//!
//! - [`ShellExecutor`]: runs the script through `sh -c`
//! - [`Recorder`]: records invocations and answers from scripted
//!   responses, without touching the system
//!
//! ## Example
//!
//! ```
//! use shellrun::{CommandOutput, Executor, Invocation, Recorder};
//!
//! let recorder = Recorder::new().respond("nginx -v", CommandOutput::failure(127, "not found"));
//!
//! let out = recorder.execute(&Invocation::new("nginx -v")).unwrap();
//! assert!(!out.success());
//!
//! let out = recorder.execute(&Invocation::new("apt update")).unwrap();
//! assert!(out.success());
//!
//! assert_eq!(recorder.scripts(), vec!["nginx -v", "apt update"]);
//! ```

pub mod executor;
pub mod recorder;
pub mod types;

pub use executor::{Executor, ShellExecutor};
pub use recorder::Recorder;
pub use types::{CommandOutput, ExecError, Invocation};
