pub mod record;
pub mod top;
