pub mod canvas;
pub mod compositor;
pub mod scratch;
pub mod shadow;
