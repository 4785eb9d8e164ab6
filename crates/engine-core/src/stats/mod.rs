pub mod histogram;
pub mod top_k;
