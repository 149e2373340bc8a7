pub mod constants;
pub mod datum;
pub mod format;
pub mod opcode;
pub mod ops;
