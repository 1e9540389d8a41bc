pub mod cc;
pub mod codegen;
pub mod runtime;

pub use cc::{Cc, CcError};
pub use codegen::{generate, CUnit, CodegenError};
pub use runtime::Helper;
