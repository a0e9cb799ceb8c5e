//! Pipeline passes

mod native_lowering;
mod provide;
mod substitute;
mod verify;

pub use native_lowering::NativeLoweringPass;
pub use provide::NativeProviderPass;
pub use substitute::SubstitutableLoweringPass;
pub use verify::{verify, VerifyBytecodePass};
