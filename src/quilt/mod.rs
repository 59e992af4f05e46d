pub use compositor::*;
pub use layout::*;

mod compositor;
mod layout;
