pub mod attribution;
pub mod cli;
pub mod config;
pub mod export;
pub mod fetch;
pub mod matcher;
pub mod name_norm;
pub mod pipeline;
pub mod reconcile;
pub mod role_analysis;
pub mod roles;
pub mod roster;
pub mod table_io;
pub mod token_sort;
pub mod valuation;
pub mod value_model;

pub use matcher::{BestMatch, CandidateIndex, match_one};
pub use name_norm::{NameNormalizer, NameOverrides, TruncationRule};
pub use reconcile::{EnrichedPlayer, Reconciliation, reconcile};
pub use roster::{CanonicalPlayer, ExternalRecord};
pub use valuation::parse_valuation;
