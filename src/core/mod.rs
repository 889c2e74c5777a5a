//! Core data types shared by every split stage.
//!
//! - [`QualifiedId`]: a sequence name tagged with its genome (`id=<genome>|<contig>`)
//! - [`ChromLabel`], [`LabelKind`]: partition keys and what they stand for
//! - [`SplitConfig`], [`ContigSelector`]: run settings, resolved once up front
//! - [`SplitError`]: the failure taxonomy of a split run
//!
//! ## Labels
//!
//! | Kind      | Example       | Has graph | In chromfile |
//! |-----------|---------------|-----------|--------------|
//! | Contig    | chr1          | yes       | yes          |
//! | Other     | chrOther      | yes       | yes          |
//! | Ambiguous | `_AMBIGUOUS_` | no        | no           |
//!
//! [`QualifiedId`]: types::QualifiedId
//! [`ChromLabel`]: types::ChromLabel
//! [`LabelKind`]: types::LabelKind
//! [`SplitConfig`]: config::SplitConfig
//! [`ContigSelector`]: config::ContigSelector
//! [`SplitError`]: error::SplitError

pub mod config;
pub mod error;
pub mod types;
