pub mod tokens;
pub mod text;
pub mod patterns;
pub mod matcher;
pub mod consolidate;
pub mod disambiguate;
pub mod interaction;
pub mod chapter;

pub use tokens::*;
pub use text::*;
pub use patterns::*;
pub use matcher::*;
pub use consolidate::*;
pub use disambiguate::*;
pub use interaction::*;
pub use chapter::*;
