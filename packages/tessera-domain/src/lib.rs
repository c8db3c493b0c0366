pub mod kinds;
pub mod modality;
pub mod properties;
pub mod query_terms;
