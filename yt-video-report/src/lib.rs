//! Daily CSV reports of the statistics of every video on the authenticated user's YouTube
//! channel.
//!
//! A run [acquires](credentials::acquire) an OAuth token, reads the channel's videos through
//! [`youtube_api`], lays them out as a [`report::ReportTable`], and has the
//! [`archive::Archiver`] write a full archive plus a slim report under a dated directory while
//! deleting the archive that has aged out.

pub mod archive;
pub mod config;
pub mod credentials;
pub mod error;
pub mod oauth;
pub mod report;
pub mod youtube_api;

pub use error::ReportError;
