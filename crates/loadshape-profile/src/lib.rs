//! Concurrency load-profile compiler.
//!
//! A [`Profile`] is declared stage by stage through [`ProfileBuilder`]. It is
//! then compiled either into the engine's single ramp-up/hold block
//! ([`simple`]) or into a table of overlapping worker cohorts ([`general`]),
//! depending on [`classifier::is_simple`].
//!
//! ```
//! use loadshape_core::CompiledSchedule;
//! use loadshape_profile::ProfileBuilder;
//! use std::time::Duration;
//!
//! # fn main() -> loadshape_core::ProfileResult<()> {
//! let profile = ProfileBuilder::new()
//!     .ramp_to(3, Duration::from_secs(10))?
//!     .ramp_to(0, Duration::from_secs(15))?
//!     .build();
//!
//! match profile.compile() {
//!     CompiledSchedule::General(plan) => assert_eq!(plan.batches.len(), 1),
//!     CompiledSchedule::Simple(_) => unreachable!("ramp down needs the batch table"),
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod classifier;
pub mod general;
mod interpolate;
mod profile;
pub mod simple;

pub use builder::ProfileBuilder;
pub use profile::{Boundary, Profile};
