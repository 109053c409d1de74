mod vec;

pub use vec::VecSource;
