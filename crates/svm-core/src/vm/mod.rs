pub mod frame;
pub mod interp;
pub mod observer;
pub mod value;

pub use frame::Frame;
pub use interp::{run, VirtualMachine};
pub use observer::{HotLoopCounter, MergeKey, NoopObserver, TraceObserver};
pub use value::Value;
