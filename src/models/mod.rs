pub mod lookup;
pub mod settings;
pub mod term;

pub use lookup::*;
pub use settings::*;
pub use term::*;
