//! Native project plumbing for hybrid app platforms.
//!
//! Everything here is synchronous and free of any server concerns:
//!
//! - [`Platform`] / [`TargetSet`] - the closed set of targets and where each
//!   one keeps its build output under the project root
//! - [`NativeDescriptor`] - a `config.xml` document with upsert-by-tag edits
//!   that leave the rest of the file untouched
//! - [`find_descriptors`] - recursive descriptor discovery
//! - [`redirect_page`] - the meta-refresh page written for the browser target

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod platform;
pub mod redirect;

pub use descriptor::NativeDescriptor;
pub use discovery::find_descriptors;
pub use error::{NativeError, Result};
pub use platform::{Platform, TargetSet, DESCRIPTOR_FILE_NAME};
pub use redirect::{redirect_page, REDIRECT_FILE_NAME};
