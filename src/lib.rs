//! An embeddable player core for compiled Shockwave movies.
//!
//! The crate consumes a pre-split chunk container (the binary parser is the
//! host's concern), builds a cast/score model from it, and drives the frame
//! loop and the Lingo bytecode virtual machine. Rendering, audio and the
//! debugger UI stay outside: the player hands a render-sprite list to the
//! host each tick and publishes debugger snapshots through listener traits.

pub mod io;
pub mod lingo;
pub mod movie;
pub mod player;
pub mod utils;
