mod dispatch;
pub(crate) mod load;

pub use dispatch::dispatch;
